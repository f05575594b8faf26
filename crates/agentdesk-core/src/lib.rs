//! Business logic for agentdesk.
//!
//! This crate defines the "ports" (the [`provider::adapter::ProviderAdapter`]
//! and [`history::source::FragmentSource`] traits) that the infrastructure
//! layer implements, plus everything that can be expressed without I/O:
//! command routing, the request lifecycle, and history reconstruction.
//! It depends only on `agentdesk-types` -- never on `agentdesk-infra`.

pub mod capability;
pub mod history;
pub mod lifecycle;
pub mod provider;
pub mod router;
