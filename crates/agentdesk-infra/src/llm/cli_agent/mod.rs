//! CliAgentAdapter -- drives a local command-line coding assistant as a
//! subprocess, one process per turn.
//!
//! The process is started as
//! `<command> <args..> -p <prompt> --output-format stream-json --verbose
//! [--resume <session>] [--model <model>]` in the turn's working context.
//! Its stdout is parsed line by line with [`stream_json::StreamJsonParser`].
//! The child is spawned with `kill_on_drop`, so dropping the fragment stream
//! (on abort or client disconnect) terminates it.

pub mod stream_json;

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;

use agentdesk_core::provider::adapter::{AdapterStream, AdapterTurn, ExecuteOptions, ProviderAdapter};
use agentdesk_types::chat::ResponseFragment;
use agentdesk_types::llm::{AdapterCapabilities, AdapterError};

use self::stream_json::StreamJsonParser;

/// Bytes of stderr kept for error reporting.
const STDERR_TAIL_BYTES: usize = 2_000;

pub struct CliAgentAdapter {
    name: String,
    command: String,
    args: Vec<String>,
    model: Option<String>,
    capabilities: AdapterCapabilities,
}

impl CliAgentAdapter {
    pub fn new(
        name: impl Into<String>,
        command: impl Into<String>,
        args: Vec<String>,
        model: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            args,
            model,
            // Prompts are passed on the command line; there is no channel
            // for image attachments.
            capabilities: AdapterCapabilities {
                images: false,
                resume: true,
                tool_events: true,
            },
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Full argument vector for one turn.
    pub fn build_args(&self, turn: &AdapterTurn, options: &ExecuteOptions) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("-p".to_string());
        args.push(turn.message.clone());
        args.push("--output-format".to_string());
        args.push("stream-json".to_string());
        args.push("--verbose".to_string());

        if let Some(session_id) = turn.session_id.as_deref().filter(|s| !s.is_empty()) {
            args.push("--resume".to_string());
            args.push(session_id.to_string());
        }

        let model = options.sampling.model.as_ref().or(self.model.as_ref());
        if let Some(model) = model {
            args.push("--model".to_string());
            args.push(model.clone());
        }
        args
    }
}

impl ProviderAdapter for CliAgentAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &AdapterCapabilities {
        &self.capabilities
    }

    async fn check_available(&self) -> Result<(), AdapterError> {
        let output = Command::new(&self.command)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| AdapterError::Spawn {
                command: self.command.clone(),
                message: e.to_string(),
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AdapterError::ProcessExit {
                status: output.status.to_string(),
                stderr: tail(&String::from_utf8_lossy(&output.stderr)),
            })
        }
    }

    fn execute(&self, turn: AdapterTurn, options: ExecuteOptions) -> AdapterStream {
        let args = self.build_args(&turn, &options);
        let program = self.command.clone();
        let cancel = options.cancel.clone();

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = turn.working_context.as_deref() {
            command.current_dir(dir);
        }
        if options.debug {
            tracing::debug!(adapter = %self.name, program = %program, ?args, "spawning CLI agent");
        }

        Box::pin(async_stream::try_stream! {
            let mut child = command.spawn().map_err(|e| AdapterError::Spawn {
                command: program.clone(),
                message: e.to_string(),
            })?;

            let stdout = child
                .stdout
                .take()
                .ok_or_else(|| AdapterError::Stream("child stdout was not captured".to_string()))?;
            let stderr_task = child.stderr.take().map(|mut stderr| {
                tokio::spawn(async move {
                    let mut buf = String::new();
                    let _ = stderr.read_to_string(&mut buf).await;
                    tail(&buf)
                })
            });

            let mut lines = BufReader::new(stdout).lines();
            let mut parser = StreamJsonParser::new();

            loop {
                let next = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(AdapterError::Aborted),
                    line = lines.next_line() => line.map_err(|e| AdapterError::Stream(e.to_string())),
                }?;
                let Some(line) = next else { break };

                let fragments = parser.parse_line(&line)?;
                for fragment in fragments {
                    yield fragment;
                }
                if parser.is_finished() {
                    break;
                }
            }

            if !parser.is_finished() {
                let status = child
                    .wait()
                    .await
                    .map_err(|e| AdapterError::Stream(e.to_string()))?;
                let stderr = match stderr_task {
                    Some(task) => task.await.unwrap_or_default(),
                    None => String::new(),
                };
                check_exit(status, stderr)?;
                yield ResponseFragment::Done {
                    session_id: parser.session_id().map(str::to_string),
                };
            }
        })
    }
}

/// Last [`STDERR_TAIL_BYTES`] of `text`, trimmed, on a char boundary.
fn tail(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    trimmed[start..].to_string()
}

fn check_exit(status: std::process::ExitStatus, stderr: String) -> Result<(), AdapterError> {
    if status.success() {
        Ok(())
    } else {
        Err(AdapterError::ProcessExit {
            status: status.to_string(),
            stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::llm::SamplingParams;
    use futures_util::StreamExt;

    async fn collect(stream: AdapterStream) -> Vec<Result<ResponseFragment, AdapterError>> {
        stream.collect().await
    }

    fn turn(message: &str, session: Option<&str>) -> AdapterTurn {
        AdapterTurn {
            message: message.to_string(),
            session_id: session.map(str::to_string),
            working_context: None,
            images: Vec::new(),
        }
    }

    #[test]
    fn test_build_args_with_resume_and_model() {
        let adapter = CliAgentAdapter::new(
            "claude",
            "claude",
            vec!["--dangerously-skip-permissions".to_string()],
            Some("sonnet".to_string()),
        );
        let args = adapter.build_args(&turn("hi", Some("sess-1")), &ExecuteOptions::default());
        assert_eq!(
            args,
            vec![
                "--dangerously-skip-permissions",
                "-p",
                "hi",
                "--output-format",
                "stream-json",
                "--verbose",
                "--resume",
                "sess-1",
                "--model",
                "sonnet",
            ]
        );
    }

    #[test]
    fn test_build_args_sampling_model_overrides() {
        let adapter = CliAgentAdapter::new("claude", "claude", Vec::new(), Some("sonnet".to_string()));
        let options = ExecuteOptions {
            sampling: SamplingParams {
                model: Some("opus".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let args = adapter.build_args(&turn("hi", None), &options);
        assert!(!args.contains(&"--resume".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("opus"));
    }

    #[test]
    fn test_capabilities_negate_images() {
        let adapter = CliAgentAdapter::new("claude", "claude", Vec::new(), None);
        assert!(!adapter.supports_images());
        assert!(adapter.capabilities().resume);
    }

    #[test]
    fn test_tail_keeps_end() {
        let long = "x".repeat(STDERR_TAIL_BYTES + 10) + "END";
        let t = tail(&long);
        assert_eq!(t.len(), STDERR_TAIL_BYTES);
        assert!(t.ends_with("END"));
    }

    #[cfg(unix)]
    fn sh_adapter(script: &str) -> CliAgentAdapter {
        // Generated flags land in sh's positional parameters and are ignored.
        CliAgentAdapter::new(
            "scripted",
            "sh",
            vec!["-c".to_string(), script.to_string(), "agent".to_string()],
            None,
        )
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_translates_stdout() {
        let adapter = sh_adapter(concat!(
            r#"echo '{"type":"system","subtype":"init","session_id":"s-9"}';"#,
            r#"echo 'not json';"#,
            r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hello"}]}}';"#,
            r#"echo '{"type":"result","subtype":"success","is_error":false,"session_id":"s-9"}'"#,
        ));
        let out = collect(adapter.execute(turn("hi", None), ExecuteOptions::default())).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].as_ref().unwrap(), &ResponseFragment::text("hello"));
        assert_eq!(
            out[1].as_ref().unwrap(),
            &ResponseFragment::Done {
                session_id: Some("s-9".to_string())
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_reports_nonzero_exit() {
        let adapter = sh_adapter("echo boom >&2; exit 3");
        let out = collect(adapter.execute(turn("hi", None), ExecuteOptions::default())).await;
        assert_eq!(out.len(), 1);
        match &out[0] {
            Err(AdapterError::ProcessExit { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected process exit error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_without_result_line_synthesizes_done() {
        let adapter = sh_adapter(
            r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"partial"}]}}'"#,
        );
        let out = collect(adapter.execute(turn("hi", None), ExecuteOptions::default())).await;
        assert_eq!(out.len(), 2);
        assert!(matches!(out[1], Ok(ResponseFragment::Done { session_id: None })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_cancelled() {
        let adapter = sh_adapter("sleep 30");
        let options = ExecuteOptions::default();
        options.cancel.cancel();
        let out = collect(adapter.execute(turn("hi", None), options)).await;
        assert!(matches!(out.as_slice(), [Err(AdapterError::Aborted)]));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let adapter = CliAgentAdapter::new("ghost", "agentdesk-no-such-binary", Vec::new(), None);
        let out = collect(adapter.execute(turn("hi", None), ExecuteOptions::default())).await;
        assert!(matches!(out.as_slice(), [Err(AdapterError::Spawn { .. })]));
        assert!(adapter.check_available().await.is_err());
    }
}
