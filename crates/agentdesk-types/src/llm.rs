//! Provider adapter types for agentdesk.
//!
//! These types describe what an adapter can do, how a single turn is
//! parameterised, and how adapter failures are reported.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ErrorKind;

/// Closed set of adapter backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Local command-line coding assistant driven as a subprocess.
    CliAgent,
    /// Hosted chat-completion API speaking the OpenAI streaming protocol.
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::CliAgent => write!(f, "cli_agent"),
            ProviderKind::OpenAiCompatible => write!(f, "openai_compatible"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cli_agent" => Ok(ProviderKind::CliAgent),
            "openai_compatible" => Ok(ProviderKind::OpenAiCompatible),
            other => Err(format!("invalid provider kind: '{other}'")),
        }
    }
}

/// Capabilities of an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterCapabilities {
    /// Whether image attachments may be sent with a turn.
    pub images: bool,
    /// Whether the backend can resume a previous session by id.
    pub resume: bool,
    /// Whether the backend reports tool invocations.
    pub tool_events: bool,
}

/// Sampling parameters forwarded to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Errors from provider adapter operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    #[error("failed to spawn '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("process exited with {status}: {stderr}")]
    ProcessExit { status: String, stderr: String },

    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("stream error: {0}")]
    Stream(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("adapter '{adapter}' does not accept image attachments")]
    ImagesUnsupported { adapter: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("request aborted")]
    Aborted,
}

impl AdapterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Aborted => ErrorKind::Aborted,
            AdapterError::ImagesUnsupported { .. } => ErrorKind::Validation,
            _ => ErrorKind::Adapter,
        }
    }
}
