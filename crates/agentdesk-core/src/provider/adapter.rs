//! ProviderAdapter trait definition.
//!
//! This is the core abstraction every backend implements. Uses RPITIT for
//! `check_available`, and a boxed stream for `execute` (streams need to be
//! object-safe for the `BoxProviderAdapter` wrapper).

use std::pin::Pin;

use futures_util::Stream;
use tokio_util::sync::CancellationToken;

use agentdesk_types::chat::{ChatTurnRequest, ImageAttachment, ResponseFragment};
use agentdesk_types::llm::{AdapterCapabilities, AdapterError, SamplingParams};

/// Lazy, finite sequence of fragments produced by one adapter call.
pub type AdapterStream =
    Pin<Box<dyn Stream<Item = Result<ResponseFragment, AdapterError>> + Send + 'static>>;

/// The adapter-facing slice of a chat request.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterTurn {
    /// Prompt text forwarded to the backend.
    pub message: String,
    /// Resume token; adapters that support resumption continue this session.
    pub session_id: Option<String>,
    /// Working directory or other execution context for the backend.
    pub working_context: Option<String>,
    /// Attached to the first user turn by adapters that accept images.
    pub images: Vec<ImageAttachment>,
}

impl AdapterTurn {
    /// Build a turn from a request. The agent's own working context is used
    /// when the request does not carry one.
    pub fn from_request(
        request: &ChatTurnRequest,
        message: String,
        agent_context: Option<&str>,
    ) -> Self {
        Self {
            message,
            session_id: request.session_id.clone(),
            working_context: request
                .working_context
                .clone()
                .or_else(|| agent_context.map(str::to_string)),
            images: request.images.clone(),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Fired by the lifecycle manager on `abort(requestId)`.
    pub cancel: CancellationToken,
    pub sampling: SamplingParams,
    pub debug: bool,
}

/// Trait for backend adapters (CLI subprocess, HTTP streaming API).
///
/// Implementations live in agentdesk-infra. The fragment stream must be
/// emitted in generation order and must be finite. Adapters should end it
/// with a `Done` fragment or an `Err`; the lifecycle layer tolerates a
/// missing terminal and supplies one.
pub trait ProviderAdapter: Send + Sync {
    /// Registry key (e.g., "claude", "openai").
    fn name(&self) -> &str;

    fn capabilities(&self) -> &AdapterCapabilities;

    /// Whether image attachments may be sent. Callers check this before
    /// attaching images.
    fn supports_images(&self) -> bool {
        self.capabilities().images
    }

    /// Cheap probe that the backend is reachable (binary on PATH, endpoint
    /// configured).
    fn check_available(&self) -> impl std::future::Future<Output = Result<(), AdapterError>> + Send;

    /// Execute one chat turn.
    ///
    /// Returns a boxed stream (not RPITIT) because streams need to be
    /// object-safe for the `BoxProviderAdapter` wrapper.
    fn execute(&self, turn: AdapterTurn, options: ExecuteOptions) -> AdapterStream;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_prefers_request_context() {
        let mut request = ChatTurnRequest::new("hi", "r1");
        request.working_context = Some("/req".to_string());
        request.session_id = Some("s1".to_string());
        let turn = AdapterTurn::from_request(&request, "hi".to_string(), Some("/agent"));
        assert_eq!(turn.working_context.as_deref(), Some("/req"));
        assert_eq!(turn.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_turn_falls_back_to_agent_context() {
        let request = ChatTurnRequest::new("hi", "r1");
        let turn = AdapterTurn::from_request(&request, "hi".to_string(), Some("/agent"));
        assert_eq!(turn.working_context.as_deref(), Some("/agent"));
        assert!(turn.images.is_empty());
    }
}
