//! Axum router configuration with middleware.
//!
//! Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(handlers::chat::chat))
        .route("/abort/{request_id}", post(handlers::chat::abort))
        .route("/agents", get(handlers::agents::list_agents))
        .route("/projects", get(handlers::history::list_projects))
        .route(
            "/projects/{encoded}/histories",
            get(handlers::history::list_histories),
        )
        .route(
            "/projects/{encoded}/histories/{session_id}",
            get(handlers::history::get_history),
        )
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - liveness probe.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
