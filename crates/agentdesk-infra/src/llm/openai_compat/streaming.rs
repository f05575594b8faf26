//! OpenAI SSE byte stream to [`ResponseFragment`] adapter.
//!
//! The response body is split into server-sent events with
//! `eventsource-stream`. Each event's `data` is one of:
//! 1. a `chat.completion.chunk` JSON object -- `delta.content` becomes a
//!    `Text` fragment, `delta.tool_calls` fragments are accumulated
//! 2. a JSON object with an `error` field -- the upstream failed mid-stream
//! 3. the literal `[DONE]` -- end of the turn
//!
//! Tool call arguments arrive as partial JSON across chunks (keyed by tool
//! call index) and are emitted as `ToolInvocation` once the choice finishes
//! with `tool_calls` or the stream ends.

use std::collections::BTreeMap;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use agentdesk_core::provider::adapter::AdapterStream;
use agentdesk_types::chat::ResponseFragment;
use agentdesk_types::llm::AdapterError;

use super::types::ChatChunk;

/// Accumulates partial JSON fragments for a tool call during streaming.
#[derive(Debug, Default)]
struct ToolCallAccumulator {
    id: String,
    name: String,
    json_buffer: String,
}

impl ToolCallAccumulator {
    fn finish(self) -> Result<ResponseFragment, AdapterError> {
        let input = if self.json_buffer.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&self.json_buffer).map_err(|e| {
                AdapterError::Deserialization(format!("tool call JSON for '{}': {e}", self.name))
            })?
        };
        Ok(ResponseFragment::ToolInvocation {
            id: self.id,
            name: self.name,
            input,
        })
    }
}

/// Drain accumulators in index order.
fn flush_tool_calls(
    accumulators: &mut BTreeMap<u32, ToolCallAccumulator>,
) -> Result<Vec<ResponseFragment>, AdapterError> {
    std::mem::take(accumulators)
        .into_values()
        .map(ToolCallAccumulator::finish)
        .collect()
}

/// Error message carried by an in-band `{"error": ...}` payload.
fn api_error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    if error.is_null() {
        return None;
    }
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(message)
}

fn check_api_error(value: &Value) -> Result<(), AdapterError> {
    match api_error_message(value) {
        Some(message) => Err(AdapterError::Provider { message }),
        None => Ok(()),
    }
}

/// Map a raw SSE byte stream into fragments.
///
/// `session_id` is echoed on the final `Done`; the completion API itself is
/// stateless. Cancellation is checked before every event.
pub fn map_sse_stream<S, B, E>(
    bytes: S,
    session_id: Option<String>,
    cancel: CancellationToken,
) -> AdapterStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::try_stream! {
        let mut events = Box::pin(bytes.eventsource());
        let mut tool_accumulators: BTreeMap<u32, ToolCallAccumulator> = BTreeMap::new();
        let mut saw_finish = false;
        let mut done = false;

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AdapterError::Aborted),
                event = events.next() => Ok(event),
            }?;
            let Some(event) = next else { break };
            let event = event.map_err(|e| AdapterError::Stream(e.to_string()))?;

            let data = event.data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                for fragment in flush_tool_calls(&mut tool_accumulators)? {
                    yield fragment;
                }
                done = true;
                break;
            }

            let value: Value = serde_json::from_str(data)
                .map_err(|e| AdapterError::Deserialization(format!("SSE payload: {e}")))?;
            check_api_error(&value)?;
            let chunk: ChatChunk = serde_json::from_value(value)
                .map_err(|e| AdapterError::Deserialization(format!("SSE chunk: {e}")))?;

            for choice in chunk.choices {
                if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                    yield ResponseFragment::Text { text };
                }

                for tc in choice.delta.tool_calls.unwrap_or_default() {
                    let acc = tool_accumulators.entry(tc.index).or_default();
                    if let Some(id) = tc.id.filter(|id| !id.is_empty()) {
                        acc.id = id;
                    }
                    if let Some(function) = tc.function {
                        if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                            acc.name = name;
                        }
                        if let Some(arguments) = function.arguments {
                            acc.json_buffer.push_str(&arguments);
                        }
                    }
                }

                if let Some(reason) = choice.finish_reason {
                    saw_finish = true;
                    if reason == "tool_calls" {
                        for fragment in flush_tool_calls(&mut tool_accumulators)? {
                            yield fragment;
                        }
                    }
                }
            }
        }

        if !done {
            if !saw_finish {
                Err::<(), _>(AdapterError::Stream(
                    "SSE stream closed before response completed".to_string(),
                ))?;
            }
            for fragment in flush_tool_calls(&mut tool_accumulators)? {
                yield fragment;
            }
        }

        yield ResponseFragment::Done { session_id };
    })
}
