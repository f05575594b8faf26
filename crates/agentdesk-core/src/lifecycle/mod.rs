//! Request lifecycle: cancellation tracking, session serialization, and the
//! fragment-to-envelope translation that drives one chat turn.

pub mod abort;
pub mod manager;
pub mod session_lock;

pub use abort::{AbortGuard, AbortRegistry};
pub use manager::{EnvelopeStream, LifecycleSettings, RequestLifecycleManager};
pub use session_lock::SessionLocks;
