//! Filesystem adapters for agentdesk.
//!
//! Implements the `FragmentSource` port from `agentdesk-core` over the
//! external tool's on-disk log tree.

pub mod history;

pub use history::LocalFragmentSource;
