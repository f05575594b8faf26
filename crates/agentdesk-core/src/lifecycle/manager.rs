//! RequestLifecycleManager -- turns one chat request into a cancellable,
//! tracked stream of transport envelopes.
//!
//! Per request: `created -> streaming -> {completed | failed | aborted}`.
//! Every stream returned by [`RequestLifecycleManager::handle`] ends with
//! exactly one terminal envelope, and the request's cancellation token is
//! removed when the stream finishes or is dropped.

use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use futures_util::{Stream, StreamExt};
use serde_json::json;

use agentdesk_types::chat::{
    ChatTurnRequest, EnvelopeKind, ResponseFragment, RoomMessage, RoomMessageKind,
    StreamEnvelope,
};
use agentdesk_types::error::{ChatError, ErrorKind};
use agentdesk_types::llm::{AdapterError, SamplingParams};

use crate::capability::{CapabilityArtifact, CapabilityHandler, CapabilityRegistry};
use crate::provider::adapter::{AdapterTurn, ExecuteOptions};
use crate::provider::fragments::guard_fragments;
use crate::provider::registry::{ProviderRegistry, ResolvedAgent};
use crate::router::{CommandRouter, RouteDecision, StructuredCommand};

use super::abort::AbortRegistry;
use super::session_lock::SessionLocks;

/// Outbound envelope stream for one request.
pub type EnvelopeStream = Pin<Box<dyn Stream<Item = StreamEnvelope> + Send>>;

/// Knobs applied to every turn.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub sampling: SamplingParams,
    pub debug: bool,
    pub serialize_sessions: bool,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            sampling: SamplingParams::default(),
            debug: false,
            serialize_sessions: true,
        }
    }
}

/// Resolved execution path for a turn.
enum TurnPlan {
    Adapter {
        agent: ResolvedAgent,
        message: String,
    },
    Capability {
        command: StructuredCommand,
        handler: Arc<dyn CapabilityHandler>,
    },
}

/// Owns in-flight request tracking and drives adapters.
///
/// Cheap to clone; all shared state sits behind `Arc`.
#[derive(Clone)]
pub struct RequestLifecycleManager {
    registry: Arc<ProviderRegistry>,
    capabilities: Arc<CapabilityRegistry>,
    router: CommandRouter,
    aborts: AbortRegistry,
    sessions: Option<SessionLocks>,
    settings: Arc<LifecycleSettings>,
}

impl RequestLifecycleManager {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        capabilities: Arc<CapabilityRegistry>,
        settings: LifecycleSettings,
    ) -> Self {
        let sessions = settings.serialize_sessions.then(SessionLocks::new);
        Self {
            registry,
            capabilities,
            router: CommandRouter::new(),
            aborts: AbortRegistry::new(),
            sessions,
            settings: Arc::new(settings),
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
        &self.capabilities
    }

    /// Number of requests currently holding a cancellation token.
    pub fn in_flight(&self) -> usize {
        self.aborts.len()
    }

    /// Signal cancellation for `request_id`.
    ///
    /// Always succeeds. Returns whether a live request was signalled; an
    /// unknown or already-finished id is a no-op.
    pub fn abort(&self, request_id: &str) -> bool {
        let signalled = self.aborts.abort(request_id);
        if signalled {
            tracing::info!(request_id, "abort requested");
        } else {
            tracing::debug!(request_id, "abort for unknown or finished request ignored");
        }
        signalled
    }

    /// Run one chat turn.
    pub fn handle(&self, request: ChatTurnRequest) -> EnvelopeStream {
        let this = self.clone();
        Box::pin(async_stream::stream! {
            let request_id = request.request_id.clone();

            if let Err(e) = validate(&request) {
                tracing::warn!(request_id = %request_id, error = %e, "rejected chat request");
                yield StreamEnvelope::error(&request_id, e.kind(), e.to_string());
                return;
            }

            let guard = match this.aborts.register(&request_id) {
                Ok(guard) => guard,
                Err(e) => {
                    tracing::warn!(request_id = %request_id, error = %e, "rejected chat request");
                    yield StreamEnvelope::error(&request_id, e.kind(), e.to_string());
                    return;
                }
            };
            let cancel = guard.token().clone();
            tracing::debug!(request_id = %request_id, state = "created", "request registered");

            let plan = match this.plan(&request) {
                Ok(plan) => plan,
                Err(e) => {
                    tracing::info!(request_id = %request_id, state = "failed", error = %e, "request failed");
                    yield StreamEnvelope::error(&request_id, e.kind(), e.to_string());
                    return;
                }
            };

            let _session = match (&this.sessions, request.session_id.as_deref()) {
                (Some(locks), Some(session_id)) => {
                    let acquired = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        g = locks.acquire(session_id) => Some(g),
                    };
                    if acquired.is_none() {
                        tracing::info!(request_id = %request_id, state = "aborted", "aborted while waiting for session");
                        yield StreamEnvelope::aborted(&request_id);
                        return;
                    }
                    acquired
                }
                _ => None,
            };

            let (agent_id, fragments) = match plan {
                TurnPlan::Adapter { agent, message } => {
                    let turn = AdapterTurn::from_request(
                        &request,
                        message,
                        agent.descriptor.working_context.as_deref(),
                    );
                    let options = ExecuteOptions {
                        cancel: cancel.clone(),
                        sampling: this.settings.sampling.clone(),
                        debug: this.settings.debug,
                    };
                    tracing::info!(
                        request_id = %request_id,
                        agent_id = %agent.descriptor.id,
                        adapter = agent.adapter.name(),
                        state = "streaming",
                        "dispatching to adapter"
                    );
                    let raw = agent.adapter.execute(turn, options);
                    (agent.descriptor.id, guard_fragments(raw, cancel.clone()))
                }
                TurnPlan::Capability { command, handler } => {
                    tracing::info!(
                        request_id = %request_id,
                        agent_id = %command.agent_id,
                        verb = %command.verb,
                        state = "streaming",
                        "invoking capability"
                    );
                    yield StreamEnvelope::room_message(
                        &request_id,
                        &room(&command.agent_id, RoomMessageKind::Command, json!({
                            "verb": command.verb,
                            "target": command.target,
                        })),
                    );
                    let agent_id = command.agent_id.clone();
                    let raw = capability_fragments(
                        handler,
                        command,
                        request.session_id.clone(),
                    );
                    (agent_id, guard_fragments(raw, cancel.clone()))
                }
            };

            let mut fragments = fragments;
            let mut terminal = EnvelopeKind::Done;
            while let Some(fragment) = fragments.next().await {
                let envelopes = translate(
                    &request_id,
                    &agent_id,
                    request.session_id.as_deref(),
                    fragment,
                );
                let mut finished = false;
                for envelope in envelopes {
                    if envelope.is_terminal() {
                        terminal = envelope.kind;
                        finished = true;
                    }
                    yield envelope;
                }
                if finished {
                    break;
                }
            }

            let state = match terminal {
                EnvelopeKind::Aborted => "aborted",
                EnvelopeKind::Error => "failed",
                _ => "completed",
            };
            tracing::info!(request_id = %request_id, agent_id = %agent_id, state, "request finished");
            drop(guard);
        })
    }

    fn plan(&self, request: &ChatTurnRequest) -> Result<TurnPlan, ChatError> {
        let overlay = request.available_agents.as_deref();
        let decision = self
            .router
            .route(&request.message, |verb| self.capabilities.supports(verb));

        let agent = match decision {
            RouteDecision::Capability { command } => {
                let handler = self.capabilities.get(command.verb).ok_or_else(|| {
                    ChatError::Capability {
                        verb: command.verb.to_string(),
                        message: "no handler registered".to_string(),
                    }
                })?;
                return Ok(TurnPlan::Capability { command, handler });
            }
            RouteDecision::SingleAgent { agent_id } => {
                self.registry.resolve_with_overlay(&agent_id, overlay)?
            }
            RouteDecision::Orchestrate { mentions } => {
                tracing::debug!(
                    request_id = %request.request_id,
                    mentions = ?mentions,
                    "delegating to orchestrator"
                );
                self.registry.orchestrator(overlay)?
            }
        };

        if !request.images.is_empty() && !agent.adapter.supports_images() {
            return Err(AdapterError::ImagesUnsupported {
                adapter: agent.adapter.name().to_string(),
            }
            .into());
        }

        Ok(TurnPlan::Adapter {
            agent,
            message: request.message.clone(),
        })
    }
}

impl std::fmt::Debug for RequestLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLifecycleManager")
            .field("agents", &self.registry.agents().len())
            .field("in_flight", &self.aborts.len())
            .field("settings", &self.settings)
            .finish()
    }
}

fn validate(request: &ChatTurnRequest) -> Result<(), ChatError> {
    if request.request_id.trim().is_empty() {
        return Err(ChatError::Validation("requestId must not be empty".to_string()));
    }
    if request.message.trim().is_empty() {
        return Err(ChatError::Validation("message must not be empty".to_string()));
    }
    Ok(())
}

fn room(agent_id: &str, kind: RoomMessageKind, content: serde_json::Value) -> RoomMessage {
    RoomMessage {
        agent_id: agent_id.to_string(),
        kind,
        content,
        timestamp: Utc::now(),
    }
}

/// Canned completion for a capability invocation.
fn capability_fragments(
    handler: Arc<dyn CapabilityHandler>,
    command: StructuredCommand,
    session_id: Option<String>,
) -> crate::provider::adapter::AdapterStream {
    Box::pin(async_stream::try_stream! {
        let artifact: CapabilityArtifact = handler
            .invoke(&command)
            .await
            .map_err(|e| AdapterError::Provider { message: e.to_string() })?;

        if let (Some(media_type), Some(data)) = (artifact.media_type, artifact.data) {
            yield ResponseFragment::Image {
                media_type,
                data,
                path: artifact.path.clone(),
            };
        }
        yield ResponseFragment::text(artifact.description);
        yield ResponseFragment::Done { session_id };
    })
}

/// Map one fragment to its envelopes: the fragment itself, plus a room
/// message for images and tool invocations.
fn translate(
    request_id: &str,
    agent_id: &str,
    request_session: Option<&str>,
    fragment: ResponseFragment,
) -> Vec<StreamEnvelope> {
    match &fragment {
        ResponseFragment::Text { .. } => vec![StreamEnvelope::claude_json(request_id, &fragment)],
        ResponseFragment::Image {
            media_type,
            data,
            path,
        } => {
            let content = json!({ "mediaType": media_type, "data": data, "path": path });
            vec![
                StreamEnvelope::claude_json(request_id, &fragment),
                StreamEnvelope::room_message(
                    request_id,
                    &room(agent_id, RoomMessageKind::Image, content),
                ),
            ]
        }
        ResponseFragment::ToolInvocation { id, name, input } => {
            let content = json!({ "id": id, "name": name, "input": input });
            vec![
                StreamEnvelope::claude_json(request_id, &fragment),
                StreamEnvelope::room_message(
                    request_id,
                    &room(agent_id, RoomMessageKind::Tool, content),
                ),
            ]
        }
        ResponseFragment::Error {
            kind: ErrorKind::Aborted,
            ..
        } => vec![StreamEnvelope::aborted(request_id)],
        ResponseFragment::Error { kind, message } => {
            vec![StreamEnvelope::error(request_id, *kind, message.clone())]
        }
        ResponseFragment::Done { session_id } => {
            let session = session_id.as_deref().or(request_session);
            vec![StreamEnvelope::done(request_id, session)]
        }
    }
}
