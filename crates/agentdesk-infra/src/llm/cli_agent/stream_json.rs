//! Parser for the CLI's `--output-format stream-json` stdout.
//!
//! One JSON object per line:
//! 1. `system` / `init` -- carries the session id
//! 2. `assistant` -- content blocks (`text`, `tool_use`, `thinking`)
//! 3. `user` -- tool results echoed back (ignored)
//! 4. `result` -- final line; `is_error` marks a failed turn
//!
//! Lines that are not JSON (warnings, progress noise) are skipped.

use serde::Deserialize;
use serde_json::Value;

use agentdesk_types::chat::ResponseFragment;
use agentdesk_types::llm::AdapterError;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CliEvent {
    System {
        #[serde(default)]
        session_id: Option<String>,
    },
    Assistant {
        message: CliMessage,
        #[serde(default)]
        session_id: Option<String>,
    },
    Result {
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct CliMessage {
    #[serde(default)]
    content: Vec<CliContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum CliContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

/// Incremental line parser. Tracks the session id across lines.
#[derive(Debug, Default)]
pub struct StreamJsonParser {
    session_id: Option<String>,
    finished: bool,
}

impl StreamJsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session id reported by the CLI so far.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Whether the final `result` line has been seen.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Parse one stdout line into zero or more fragments.
    pub fn parse_line(&mut self, line: &str) -> Result<Vec<ResponseFragment>, AdapterError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let event: CliEvent = match serde_json::from_str(trimmed) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring non-JSON CLI output line");
                return Ok(Vec::new());
            }
        };

        match event {
            CliEvent::System { session_id } => {
                self.remember(session_id);
                Ok(Vec::new())
            }
            CliEvent::Assistant {
                message,
                session_id,
            } => {
                self.remember(session_id);
                let fragments = message
                    .content
                    .into_iter()
                    .filter_map(|block| match block {
                        CliContentBlock::Text { text } if !text.is_empty() => {
                            Some(ResponseFragment::Text { text })
                        }
                        CliContentBlock::ToolUse { id, name, input } => {
                            Some(ResponseFragment::ToolInvocation { id, name, input })
                        }
                        _ => None,
                    })
                    .collect();
                Ok(fragments)
            }
            CliEvent::Result {
                subtype,
                is_error,
                result,
                session_id,
            } => {
                self.remember(session_id);
                self.finished = true;
                if is_error {
                    let message = result
                        .or(subtype)
                        .unwrap_or_else(|| "CLI reported an error".to_string());
                    return Err(AdapterError::Provider { message });
                }
                Ok(vec![ResponseFragment::Done {
                    session_id: self.session_id.clone(),
                }])
            }
            CliEvent::Other => Ok(Vec::new()),
        }
    }

    fn remember(&mut self, session_id: Option<String>) {
        if let Some(id) = session_id.filter(|s| !s.is_empty()) {
            self.session_id = Some(id);
        }
    }
}
