//! HTTP surface for agentdesk.
//!
//! Axum router with a streaming NDJSON chat endpoint, abort, read-only
//! history endpoints, and CORS support.

pub mod error;
pub mod handlers;
pub mod router;
