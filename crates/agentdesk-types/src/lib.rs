//! Shared domain types for agentdesk.
//!
//! This crate contains the types that flow between the chat orchestration
//! layer and the history reconstruction engine: chat requests, response
//! fragments, stream envelopes, reconstructed conversations, configuration,
//! and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod history;
pub mod llm;
