//! Grouping and deduplication of records across fragment files.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde_json::Value;

use agentdesk_types::history::{ConversationFragmentFile, MessageRole, RawRecord};

/// A record placed in merged order, not yet timestamp-restored.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedMessage {
    pub role: MessageRole,
    pub content: Value,
    pub timestamp: Option<DateTime<Utc>>,
    pub uuid: Option<String>,
    /// Modification time of the file the message came from.
    pub fallback: DateTime<Utc>,
}

/// Result of merging every file that contributes to one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedSession {
    pub messages: Vec<MergedMessage>,
    pub duplicates_removed: usize,
    pub source_files: Vec<String>,
    pub skipped_lines: usize,
    pub agent_id: Option<String>,
}

/// Session a record belongs to: its own `sessionId`, else the file's.
fn effective_session<'a>(file: &'a ConversationFragmentFile, record: &'a RawRecord) -> &'a str {
    record.session_id.as_deref().unwrap_or(&file.session_id)
}

/// Every session id with at least one record, plus ids of files that
/// contain none.
pub fn session_ids(files: &[ConversationFragmentFile]) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for file in files {
        if file.records.is_empty() {
            ids.insert(file.session_id.clone());
        }
        for record in &file.records {
            ids.insert(effective_session(file, record).to_string());
        }
    }
    ids
}

/// Merge the records of `session_id` from all files.
///
/// Files are taken in modification order (path breaks ties), records in line
/// order. A record whose content and timestamp both match an earlier one is
/// a duplicate flush and is dropped.
///
/// Sub-agent records share the parent's session id. They are left out while
/// the session has any main-line record; a session made only of sub-agent
/// records is merged on its own and reports that agent's id.
pub fn merge_session(files: &[ConversationFragmentFile], session_id: &str) -> MergedSession {
    let mut participating: Vec<&ConversationFragmentFile> = files
        .iter()
        .filter(|f| {
            f.session_id == session_id
                || f.records
                    .iter()
                    .any(|r| effective_session(f, r) == session_id)
        })
        .collect();
    participating.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    let has_main_line = participating.iter().any(|f| {
        f.records
            .iter()
            .any(|r| !r.sidechain && effective_session(f, r) == session_id)
    });

    let mut merged = MergedSession::default();
    let mut seen: HashSet<(String, Option<DateTime<Utc>>)> = HashSet::new();

    for file in participating {
        let mut records: Vec<&RawRecord> = file
            .records
            .iter()
            .filter(|r| effective_session(file, r) == session_id)
            .filter(|r| r.sidechain != has_main_line)
            .collect();
        if records.is_empty() && !file.records.is_empty() {
            continue;
        }
        records.sort_by_key(|r| r.line);

        merged.source_files.push(file.path.display().to_string());
        merged.skipped_lines += file.skipped_lines;

        for record in records {
            if !has_main_line && merged.agent_id.is_none() {
                merged.agent_id = record.agent_id.clone();
            }
            let key = (record.content.to_string(), record.timestamp);
            if !seen.insert(key) {
                merged.duplicates_removed += 1;
                continue;
            }
            merged.messages.push(MergedMessage {
                role: record.role,
                content: record.content.clone(),
                timestamp: record.timestamp,
                uuid: record.uuid.clone(),
                fallback: file.modified,
            });
        }
    }

    merged
}
