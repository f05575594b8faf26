//! Per-session serialization of chat turns.
//!
//! Two turns resuming the same session would otherwise race on the backend's
//! resumed state. Each session id maps to an async mutex; entries are pruned
//! once the last holder releases.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other turn holds `session_id`.
    pub async fn acquire(&self, session_id: &str) -> SessionGuard {
        // Clone the Arc out before awaiting; a DashMap ref must not be held
        // across the lock wait.
        let mutex = self
            .locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        SessionGuard {
            locks: Arc::clone(&self.locks),
            session_id: session_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of sessions with a holder or waiter.
    pub fn active(&self) -> usize {
        self.locks.len()
    }
}

#[derive(Debug)]
pub struct SessionGuard {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        // Release first so the map holds the only remaining reference when idle.
        self.guard.take();
        self.locks
            .remove_if(&self.session_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
