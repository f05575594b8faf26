//! Request handlers, one module per resource.

pub mod agents;
pub mod chat;
pub mod history;
