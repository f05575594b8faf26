//! Request id -> cancellation token registry.
//!
//! Tokens are inserted when a request starts and removed exactly once,
//! either by an explicit `abort` or by the [`AbortGuard`] dropping at the end
//! of the request. A generation counter keeps a late guard from removing an
//! entry that a newer request with the same id has since registered.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio_util::sync::CancellationToken;

use agentdesk_types::error::ChatError;

#[derive(Debug, Clone)]
struct AbortEntry {
    generation: u64,
    token: CancellationToken,
}

#[derive(Debug, Clone, Default)]
pub struct AbortRegistry {
    entries: Arc<DashMap<String, AbortEntry>>,
    next_generation: Arc<AtomicU64>,
}

impl AbortRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fresh token for `request_id`.
    ///
    /// Fails with a validation error if the id is already in flight.
    pub fn register(&self, request_id: &str) -> Result<AbortGuard, ChatError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        match self.entries.entry(request_id.to_string()) {
            Entry::Occupied(_) => Err(ChatError::Validation(format!(
                "request '{request_id}' is already in flight"
            ))),
            Entry::Vacant(slot) => {
                slot.insert(AbortEntry {
                    generation,
                    token: token.clone(),
                });
                Ok(AbortGuard {
                    entries: Arc::clone(&self.entries),
                    request_id: request_id.to_string(),
                    generation,
                    token,
                })
            }
        }
    }

    /// Signal and remove the token for `request_id`.
    ///
    /// Returns `true` if a live request was signalled. Unknown or finished
    /// ids are a no-op.
    pub fn abort(&self, request_id: &str) -> bool {
        match self.entries.remove(request_id) {
            Some((_, entry)) => {
                entry.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.entries.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Owns one registration; dropping it removes the entry if it is still ours.
#[derive(Debug)]
pub struct AbortGuard {
    entries: Arc<DashMap<String, AbortEntry>>,
    request_id: String,
    generation: u64,
    token: CancellationToken,
}

impl AbortGuard {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

impl Drop for AbortGuard {
    fn drop(&mut self) {
        let generation = self.generation;
        self.entries
            .remove_if(&self.request_id, |_, entry| entry.generation == generation);
    }
}
