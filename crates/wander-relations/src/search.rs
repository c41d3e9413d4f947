//! Username search.

use std::time::Duration;

use crate::model::{Profile, UserId};
use crate::store::RelationshipStore;

/// Quiet period callers should debounce keystrokes by before invoking
/// [`SearchEngine::search`] (see [`crate::debounce`]).
pub const DEBOUNCE_QUIET_PERIOD: Duration = Duration::from_millis(400);

/// Result limit per query. No pagination.
pub const RESULT_LIMIT: usize = 5;

/// Case-insensitive username prefix search over profiles.
pub struct SearchEngine {
    store: RelationshipStore,
    user_id: UserId,
}

impl SearchEngine {
    pub fn new(store: RelationshipStore, user_id: UserId) -> Self {
        Self { store, user_id }
    }

    /// Up to [`RESULT_LIMIT`] profiles whose username starts with `query`,
    /// excluding the current user, in the store's default order.
    ///
    /// An empty or whitespace-only query returns no results without
    /// contacting the store. A store error is logged and surfaced as an
    /// empty result set — search failures are never fatal to the UI.
    pub async fn search(&self, query: &str) -> Vec<Profile> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        match self
            .store
            .search_profiles(trimmed, &self.user_id, RESULT_LIMIT)
            .await
        {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(query = %trimmed, error = %e, "user search failed");
                Vec::new()
            }
        }
    }
}
