//! Streaming chat endpoint and abort.
//!
//! POST /chat
//!
//! Streams one [`StreamEnvelope`] per line (`application/x-ndjson`) until the
//! single terminal envelope (`done`, `error` or `aborted`). Failures after
//! the response has started are reported in-band, never as an HTTP status.
//! Dropping the connection drops the envelope stream, which releases the
//! request's cancellation token and stops the adapter.
//!
//! [`StreamEnvelope`]: agentdesk_types::chat::StreamEnvelope

use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::Response;
use futures_util::StreamExt;
use serde::Serialize;

use agentdesk_types::chat::ChatTurnRequest;

use crate::http::error::AppError;
use crate::state::AppState;

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatTurnRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    tracing::debug!(
        request_id = %request.request_id,
        session_id = ?request.session_id,
        images = request.images.len(),
        "chat request received"
    );

    let lines = state
        .lifecycle
        .handle(request)
        .map(|envelope| Ok::<_, Infallible>(envelope.to_ndjson_line()));

    Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(lines))
        .map_err(|e| AppError::Internal(format!("failed to build response: {e}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbortResponse {
    pub request_id: String,
    /// Whether a live request was signalled.
    pub aborted: bool,
}

/// POST /abort/{request_id}
///
/// Idempotent: unknown or finished ids succeed with `aborted: false`.
pub async fn abort(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Json<AbortResponse> {
    let aborted = state.lifecycle.abort(&request_id);
    Json(AbortResponse {
        request_id,
        aborted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::chat::{EnvelopeKind, StreamEnvelope};

    async fn envelopes(response: Response) -> Vec<StreamEnvelope> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_chat_streams_ndjson() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = crate::state::tests::scripted_state(
            concat!(
                r#"echo '{"type":"assistant","message":{"content":[{"type":"text","text":"hi there"}]}}';"#,
                r#"echo '{"type":"result","subtype":"success","is_error":false,"session_id":"s-1"}'"#,
            ),
            tmp.path(),
        );

        let response = chat(State(state), Ok(Json(ChatTurnRequest::new("hello", "r-1"))))
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-ndjson"
        );
        assert_eq!(response.headers()["x-accel-buffering"], "no");

        let out = envelopes(response).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].kind, EnvelopeKind::ClaudeJson);
        assert_eq!(out[1].kind, EnvelopeKind::Done);
        assert!(out.iter().all(|e| e.request_id == "r-1"));
        assert_eq!(out.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn test_chat_unknown_agent_is_in_band_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = crate::state::tests::scripted_state("true", tmp.path());

        let response = chat(State(state), Ok(Json(ChatTurnRequest::new("@ghost hi", "r-2"))))
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);

        let out = envelopes(response).await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, EnvelopeKind::Error);
        assert_eq!(
            out[0].error_kind,
            Some(agentdesk_types::error::ErrorKind::NotFound)
        );
    }

    #[tokio::test]
    async fn test_abort_unknown_request_is_noop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = crate::state::tests::scripted_state("true", tmp.path());
        let Json(body) = abort(State(state), Path("nope".to_string())).await;
        assert_eq!(body.request_id, "nope");
        assert!(!body.aborted);
    }
}
