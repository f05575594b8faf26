//! Permissive JSON-lines parsing of one fragment file.
//!
//! A malformed line is logged and counted, never fatal. Lines that parse but
//! carry no user/assistant message (summaries, snapshots, system noise) are
//! ignored silently.

use chrono::{DateTime, Utc};
use serde_json::Value;

use agentdesk_types::history::{ConversationFragmentFile, MessageRole, RawRecord};

use super::source::FragmentFileMeta;

/// Parse the full text of a fragment file.
pub fn parse_fragment(meta: &FragmentFileMeta, content: &str) -> ConversationFragmentFile {
    let mut records = Vec::new();
    let mut skipped_lines = 0;

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    path = %meta.path.display(),
                    line = line_no,
                    error = %e,
                    "skipping malformed history line"
                );
                skipped_lines += 1;
                continue;
            }
        };

        if let Some(record) = record_from_value(&value, line_no) {
            records.push(record);
        }
    }

    let session_id = records
        .iter()
        .find_map(|r| r.session_id.clone())
        .or_else(|| {
            meta.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    let agent_id = records.iter().find_map(|r| r.agent_id.clone());

    ConversationFragmentFile {
        path: meta.path.clone(),
        session_id,
        agent_id,
        modified: meta.modified,
        records,
        skipped_lines,
    }
}

fn record_from_value(value: &Value, line: usize) -> Option<RawRecord> {
    let record_type = value.get("type").and_then(Value::as_str)?;
    if record_type != "user" && record_type != "assistant" {
        return None;
    }

    let message = value.get("message").filter(|m| m.is_object())?;
    let role = message
        .get("role")
        .and_then(Value::as_str)
        .unwrap_or(record_type)
        .parse::<MessageRole>()
        .ok()?;
    let content = message.get("content").cloned().unwrap_or(Value::Null);

    let timestamp = value
        .get("timestamp")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let agent_id = string_field(value, "agentId");
    let sidechain = value
        .get("isSidechain")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || agent_id.is_some();

    Some(RawRecord {
        line,
        session_id: string_field(value, "sessionId"),
        agent_id,
        sidechain,
        uuid: string_field(value, "uuid"),
        timestamp,
        role,
        content,
    })
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
