//! Chat request, response fragment, and stream envelope types.
//!
//! A [`ChatTurnRequest`] enters the lifecycle manager, adapters produce
//! [`ResponseFragment`]s, and the transport receives one [`StreamEnvelope`]
//! per fragment followed by exactly one terminal envelope.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorKind;

/// One user-initiated send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatTurnRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Caller-supplied, unique among in-flight requests.
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_agents: Option<Vec<AgentDescriptor>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,
}

impl ChatTurnRequest {
    /// Minimal request with just a message and a request id.
    pub fn new(message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            session_id: None,
            request_id: request_id.into(),
            working_context: None,
            available_agents: None,
            images: Vec::new(),
        }
    }
}

/// Base64-encoded image sent with a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAttachment {
    pub media_type: String,
    pub data: String,
}

impl ImageAttachment {
    /// `data:` URL form used by chat-completion APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A configured agent identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_context: Option<String>,
    /// Name of the adapter this agent routes to.
    pub endpoint: String,
    #[serde(default)]
    pub is_orchestrator: bool,
}

/// Closed set of structured command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandVerb {
    CaptureScreen,
    AnalyzeImage,
    ImplementChanges,
    ReviewCode,
}

impl CommandVerb {
    pub const ALL: [CommandVerb; 4] = [
        CommandVerb::CaptureScreen,
        CommandVerb::AnalyzeImage,
        CommandVerb::ImplementChanges,
        CommandVerb::ReviewCode,
    ];
}

impl fmt::Display for CommandVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandVerb::CaptureScreen => write!(f, "capture_screen"),
            CommandVerb::AnalyzeImage => write!(f, "analyze_image"),
            CommandVerb::ImplementChanges => write!(f, "implement_changes"),
            CommandVerb::ReviewCode => write!(f, "review_code"),
        }
    }
}

impl FromStr for CommandVerb {
    type Err = String;

    /// Accepts both `capture_screen` and `capture-screen` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "capture_screen" => Ok(CommandVerb::CaptureScreen),
            "analyze_image" => Ok(CommandVerb::AnalyzeImage),
            "implement_changes" => Ok(CommandVerb::ImplementChanges),
            "review_code" => Ok(CommandVerb::ReviewCode),
            other => Err(format!("invalid command verb: '{other}'")),
        }
    }
}

/// One incremental unit of a streamed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFragment {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        media_type: String,
        data: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    ToolInvocation {
        id: String,
        name: String,
        input: Value,
    },
    Error {
        kind: ErrorKind,
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}

impl ResponseFragment {
    pub fn text(text: impl Into<String>) -> Self {
        ResponseFragment::Text { text: text.into() }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        ResponseFragment::Error {
            kind,
            message: message.into(),
        }
    }

    pub fn aborted() -> Self {
        ResponseFragment::error(ErrorKind::Aborted, "request aborted")
    }

    /// `done` and `error` end a fragment sequence.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResponseFragment::Done { .. } | ResponseFragment::Error { .. }
        )
    }
}

/// Kind of a transport envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    ClaudeJson,
    RoomMessage,
    Error,
    Done,
    Aborted,
}

impl EnvelopeKind {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EnvelopeKind::Error | EnvelopeKind::Done | EnvelopeKind::Aborted
        )
    }
}

/// Transport-level wrapper written as one NDJSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEnvelope {
    pub kind: EnvelopeKind,
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl StreamEnvelope {
    fn bare(kind: EnvelopeKind, request_id: &str) -> Self {
        Self {
            kind,
            request_id: request_id.to_string(),
            payload: None,
            error_message: None,
            error_kind: None,
        }
    }

    pub fn claude_json(request_id: &str, fragment: &ResponseFragment) -> Self {
        Self {
            payload: serde_json::to_value(fragment).ok(),
            ..Self::bare(EnvelopeKind::ClaudeJson, request_id)
        }
    }

    pub fn room_message(request_id: &str, message: &RoomMessage) -> Self {
        Self {
            payload: serde_json::to_value(message).ok(),
            ..Self::bare(EnvelopeKind::RoomMessage, request_id)
        }
    }

    pub fn error(request_id: &str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            error_kind: Some(kind),
            ..Self::bare(EnvelopeKind::Error, request_id)
        }
    }

    pub fn done(request_id: &str, session_id: Option<&str>) -> Self {
        Self {
            payload: session_id.map(|sid| serde_json::json!({ "sessionId": sid })),
            ..Self::bare(EnvelopeKind::Done, request_id)
        }
    }

    pub fn aborted(request_id: &str) -> Self {
        Self {
            error_message: Some("request aborted".to_string()),
            error_kind: Some(ErrorKind::Aborted),
            ..Self::bare(EnvelopeKind::Aborted, request_id)
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }

    /// Serialize as one newline-terminated NDJSON record.
    pub fn to_ndjson_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"kind":"error","requestId":"","errorMessage":"failed to serialize envelope"}"#
                .to_string()
        });
        line.push('\n');
        line
    }
}

/// Kind of an adapter-independent room event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomMessageKind {
    Image,
    Tool,
    Command,
}

/// Structured event rendered uniformly regardless of which adapter produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMessage {
    pub agent_id: String,
    pub kind: RoomMessageKind,
    pub content: Value,
    pub timestamp: DateTime<Utc>,
}
