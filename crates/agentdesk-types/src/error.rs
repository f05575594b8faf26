use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::AdapterError;

/// Machine-distinguishable failure kind carried by error envelopes and
/// HTTP error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Adapter,
    Aborted,
    PartialParse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Validation => write!(f, "validation"),
            ErrorKind::Adapter => write!(f, "adapter"),
            ErrorKind::Aborted => write!(f, "aborted"),
            ErrorKind::PartialParse => write!(f, "partial_parse"),
        }
    }
}

/// Errors from provider registry lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("agent '{0}' not found")]
    AgentNotFound(String),

    #[error("adapter '{endpoint}' for agent '{agent_id}' not found")]
    AdapterNotFound { agent_id: String, endpoint: String },

    #[error("no orchestrator agent is configured")]
    NoOrchestrator,
}

/// Errors surfaced while handling one chat turn.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid request: {0}")]
    Validation(String),

    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("request '{0}' was aborted")]
    Aborted(String),

    #[error("capability '{verb}' failed: {message}")]
    Capability { verb: String, message: String },
}

impl ChatError {
    /// Kind reported to the transport layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::Registry(_) => ErrorKind::NotFound,
            ChatError::Validation(_) => ErrorKind::Validation,
            ChatError::Adapter(e) => e.kind(),
            ChatError::Aborted(_) => ErrorKind::Aborted,
            ChatError::Capability { .. } => ErrorKind::Adapter,
        }
    }
}

/// Errors from the history reconstruction engine.
///
/// Corrupt lines inside a fragment file are not represented here: they are
/// skipped and logged by the parser and never reach the caller.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("project '{0}' not found")]
    ProjectNotFound(String),

    #[error("session '{session_id}' not found in project '{project}'")]
    SessionNotFound { project: String, session_id: String },

    #[error("invalid project name: {0}")]
    InvalidProject(String),

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HistoryError {
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HistoryError::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HistoryError::ProjectNotFound(_) | HistoryError::SessionNotFound { .. } => {
                ErrorKind::NotFound
            }
            HistoryError::InvalidProject(_) => ErrorKind::Validation,
            HistoryError::Io { .. } => ErrorKind::Adapter,
        }
    }
}
