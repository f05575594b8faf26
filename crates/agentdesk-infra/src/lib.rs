//! Infrastructure layer for agentdesk.
//!
//! Contains implementations of the ports defined in `agentdesk-core`:
//! the CLI subprocess and OpenAI-compatible streaming adapters, the local
//! filesystem fragment source, the stub screen-capture capability, and the
//! TOML configuration loader.

pub mod capture;
pub mod config;
pub mod filesystem;
pub mod llm;
