//! In-flight operation tracking.
//!
//! At most one mutating operation per counterpart at a time: `begin` hands
//! out a token only when the id is not already in flight, and the token
//! removes the id again on drop, so the set cannot leak an entry on any
//! exit path — early return, store error, or panic.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::model::UserId;

/// Set of counterpart ids with a mutating operation in flight.
///
/// An explicit state container passed into the controller (not ambient
/// component state), so the controller is testable headless. Purely a
/// re-entrancy/UI guard; never persisted.
#[derive(Clone, Default)]
pub struct PendingOps {
    inner: Arc<Mutex<HashSet<UserId>>>,
}

impl PendingOps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` in flight. Returns `None` when an operation for `id` is
    /// already running — the caller must treat that as "ignore this call".
    pub fn begin(&self, id: &str) -> Option<PendingToken> {
        let mut set = self.inner.lock();
        if !set.insert(id.to_string()) {
            return None;
        }
        Some(PendingToken {
            id: id.to_string(),
            set: Arc::clone(&self.inner),
        })
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.inner.lock().contains(id)
    }

    /// Snapshot of the ids currently in flight.
    pub fn snapshot(&self) -> HashSet<UserId> {
        self.inner.lock().clone()
    }
}

/// Clears its id from the pending set when dropped.
pub struct PendingToken {
    id: UserId,
    set: Arc<Mutex<HashSet<UserId>>>,
}

impl Drop for PendingToken {
    fn drop(&mut self) {
        self.set.lock().remove(&self.id);
    }
}
