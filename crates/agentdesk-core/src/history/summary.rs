//! Summary derivation and preview rendering.

use serde_json::Value;

use agentdesk_types::history::{ConversationSummary, ReconstructedConversation, TimestampedMessage};

/// Plain text of a message body: strings as-is, content-block arrays joined
/// by their `text` parts.
pub fn extract_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                item.get("text")
                    .and_then(Value::as_str)
                    .or_else(|| item.as_str())
            })
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// Collapse whitespace and cap at `max_chars`, marking truncation with `…`.
pub fn truncate_preview(input: &str, max_chars: usize) -> String {
    let normalized = input.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.chars().count() <= max_chars {
        return normalized;
    }

    let mut out: String = normalized
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect();
    out.push('…');
    out
}

/// Summary of a merged, deduplicated message list. `None` when empty.
pub fn summarize(
    session_id: &str,
    messages: &[TimestampedMessage],
    agent_id: Option<&str>,
    preview_chars: usize,
) -> Option<ConversationSummary> {
    let last = messages.last()?;
    let start_time = messages.iter().map(|m| m.timestamp).min()?;
    let last_time = messages.iter().map(|m| m.timestamp).max()?;

    Some(ConversationSummary {
        session_id: session_id.to_string(),
        start_time,
        last_time,
        message_count: messages.len(),
        last_message_preview: truncate_preview(&extract_text(&last.content), preview_chars),
        agent_id: agent_id.map(str::to_string),
    })
}

/// Summary recomputed from a full reconstruction.
pub fn summarize_conversation(
    conversation: &ReconstructedConversation,
    preview_chars: usize,
) -> Option<ConversationSummary> {
    summarize(
        &conversation.session_id,
        &conversation.messages,
        conversation.metadata.agent_id.as_deref(),
        preview_chars,
    )
}
