//! Read-only history endpoints.
//!
//! - GET /projects
//! - GET /projects/{encoded}/histories
//! - GET /projects/{encoded}/histories/{session_id}
//!
//! Everything is recomputed from the fragment files on each call.

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use agentdesk_core::history::project::normalize_project_arg;
use agentdesk_types::history::{HistoryListing, ReconstructedConversation};

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProjectList {
    pub projects: Vec<String>,
}

/// GET /projects
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<ProjectList>, AppError> {
    let projects = state.history.list_projects().await?;
    Ok(Json(ProjectList { projects }))
}

/// GET /projects/{encoded}/histories
pub async fn list_histories(
    State(state): State<AppState>,
    Path(encoded): Path<String>,
) -> Result<Json<HistoryListing>, AppError> {
    let project = normalize_project_arg(&encoded);
    let conversations = state.history.list_summaries(&project).await?;
    Ok(Json(HistoryListing { conversations }))
}

/// GET /projects/{encoded}/histories/{session_id}
pub async fn get_history(
    State(state): State<AppState>,
    Path((encoded, session_id)): Path<(String, String)>,
) -> Result<Json<ReconstructedConversation>, AppError> {
    let project = normalize_project_arg(&encoded);
    let conversation = state.history.reconstruct(&project, &session_id).await?;
    Ok(Json(conversation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    async fn seeded() -> (tempfile::TempDir, AppState) {
        let tmp = tempfile::TempDir::new().unwrap();
        let project = tmp.path().join("-work-app");
        tokio::fs::create_dir_all(&project).await.unwrap();
        let lines = concat!(
            r#"{"type":"user","sessionId":"abc","timestamp":"2025-01-01T10:00:00Z","message":{"role":"user","content":"hi"}}"#,
            "\n",
            r#"{"type":"assistant","sessionId":"abc","message":{"role":"assistant","content":"hello"}}"#,
            "\n",
            r#"{"type":"user","sessionId":"abc","timestamp":"2025-01-01T10:10:00Z","message":{"role":"user","content":"bye"}}"#,
            "\n",
        );
        tokio::fs::write(project.join("abc.jsonl"), lines).await.unwrap();
        let state = crate::state::tests::scripted_state("true", tmp.path());
        (tmp, state)
    }

    #[tokio::test]
    async fn test_list_projects() {
        let (_tmp, state) = seeded().await;
        let Json(list) = list_projects(State(state)).await.unwrap();
        assert_eq!(list.projects, vec!["-work-app"]);
    }

    #[tokio::test]
    async fn test_list_histories_accepts_raw_path() {
        let (_tmp, state) = seeded().await;
        let Json(listing) = list_histories(State(state), Path("/work/app".to_string()))
            .await
            .unwrap();
        assert_eq!(listing.conversations.len(), 1);
        assert_eq!(listing.conversations[0].session_id, "abc");
        assert_eq!(listing.conversations[0].message_count, 3);
    }

    #[tokio::test]
    async fn test_get_history_restores_timestamps() {
        let (_tmp, state) = seeded().await;
        let Json(conversation) = get_history(
            State(state),
            Path(("-work-app".to_string(), "abc".to_string())),
        )
        .await
        .unwrap();
        assert_eq!(conversation.messages.len(), 3);
        assert!(conversation.messages[1].timestamp_restored);
        assert_eq!(
            conversation.messages[1].timestamp.to_rfc3339(),
            "2025-01-01T10:05:00+00:00"
        );
        assert_eq!(conversation.metadata.timestamps_restored, 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let (_tmp, state) = seeded().await;
        let err = get_history(
            State(state),
            Path(("-work-app".to_string(), "zzz".to_string())),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_project_is_404() {
        let (_tmp, state) = seeded().await;
        let err = list_histories(State(state), Path("-elsewhere".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
