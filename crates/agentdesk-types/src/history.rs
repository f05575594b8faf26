//! Conversation history types.
//!
//! Fragment files are append-only JSON-lines logs written by an external CLI
//! process. These types model one parsed file, the messages reconstructed
//! from one or more files sharing a session id, and the derived summaries.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a message in a reconstructed conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// One message-bearing line of a fragment file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line number inside the source file.
    pub line: usize,
    pub session_id: Option<String>,
    pub agent_id: Option<String>,
    /// Written by a sub-agent on a side branch of the session.
    pub sidechain: bool,
    pub uuid: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub role: MessageRole,
    pub content: Value,
}

/// One physical log file, parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationFragmentFile {
    pub path: PathBuf,
    pub session_id: String,
    pub agent_id: Option<String>,
    pub modified: DateTime<Utc>,
    pub records: Vec<RawRecord>,
    /// Lines skipped because they were not valid JSON.
    pub skipped_lines: usize,
}

/// A message with a (possibly restored) timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampedMessage {
    pub role: MessageRole,
    pub content: Value,
    pub timestamp: DateTime<Utc>,
    /// True when the source record had no timestamp and one was restored.
    #[serde(default)]
    pub timestamp_restored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
}

/// Derived per-session summary, recomputed on every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub last_time: DateTime<Utc>,
    pub message_count: usize,
    pub last_message_preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Provenance of a reconstructed conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    pub project: String,
    pub source_files: Vec<String>,
    pub duplicates_removed: usize,
    pub timestamps_restored: usize,
    pub skipped_lines: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Full transcript of one logical conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructedConversation {
    pub session_id: String,
    pub messages: Vec<TimestampedMessage>,
    pub metadata: ConversationMetadata,
}

/// Response body of the history listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryListing {
    pub conversations: Vec<ConversationSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let parsed: MessageRole = role.to_string().parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let now = Utc::now();
        let summary = ConversationSummary {
            session_id: "abc".to_string(),
            start_time: now,
            last_time: now,
            message_count: 3,
            last_message_preview: "hello".to_string(),
            agent_id: None,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["sessionId"], "abc");
        assert_eq!(value["messageCount"], 3);
        assert_eq!(value["lastMessagePreview"], "hello");
        assert!(value.get("agentId").is_none());
    }
}
