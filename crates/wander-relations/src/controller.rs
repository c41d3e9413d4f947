//! The relationship state machine.
//!
//! [`RelationshipController`] is the only writer of relationship state.
//! Each mutating operation re-derives ground truth from the store before
//! writing — another browser session, or both users clicking "add" at
//! nearly the same moment, can race this one — so `send` is idempotent and
//! a collision resolves to `incoming`/`friends` instead of a duplicate
//! row. Within one operation the store calls are strictly sequential;
//! across operations the only ordering guard is the pending set, which
//! refuses a second operation for a counterpart already in flight.
//!
//! Nothing here escapes as an error: every operation resolves normally and
//! reports through state updates and [`EventBus`] notices.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use wander_store::StoreBackend;

use crate::events::{EventBus, NoticeKind};
use crate::index::RelationshipIndex;
use crate::model::{IncomingRequest, Profile, RelationshipState, UserId};
use crate::pending::PendingOps;
use crate::search::SearchEngine;
use crate::store::RelationshipStore;

pub struct RelationshipController {
    store: RelationshipStore,
    search: SearchEngine,
    user_id: UserId,
    index: RwLock<RelationshipIndex>,
    results: RwLock<Vec<Profile>>,
    fetching: RwLock<bool>,
    pending: PendingOps,
    bus: EventBus,
}

impl RelationshipController {
    /// `user_id` is the authenticated user. The composition root must not
    /// construct a controller before login; there is no "logged out"
    /// state inside the engine.
    pub fn new(backend: Arc<dyn StoreBackend>, user_id: impl Into<UserId>, bus: EventBus) -> Self {
        let user_id = user_id.into();
        let store = RelationshipStore::new(backend);
        Self {
            search: SearchEngine::new(store.clone(), user_id.clone()),
            store,
            user_id,
            index: RwLock::default(),
            results: RwLock::default(),
            fetching: RwLock::new(false),
            pending: PendingOps::new(),
            bus,
        }
    }

    // ── Loading and search ──────────────────────────────────────────

    /// Rebuild the relationship projection wholesale from the store. Run
    /// once per session or user change; mutations keep it current after
    /// that.
    pub async fn load(&self) {
        let index = RelationshipIndex::build(&self.store, &self.user_id).await;
        *self.index.write() = index;
    }

    /// Run a caller-debounced username search and publish the results.
    pub async fn search(&self, query: &str) {
        if query.trim().is_empty() {
            self.results.write().clear();
            *self.fetching.write() = false;
            return;
        }
        *self.fetching.write() = true;
        let found = self.search.search(query).await;
        *self.results.write() = found;
        *self.fetching.write() = false;
    }

    // ── Mutating operations ─────────────────────────────────────────

    /// Send a friend request to `to_id`.
    ///
    /// Re-checks the store first: an existing request in either direction
    /// resyncs local state to `requested` or `incoming`, an existing
    /// friendship resyncs to `friends`; only then is a new pending request
    /// inserted. Ignored while another operation for `to_id` is in flight.
    pub async fn send_request(&self, to_id: &str) {
        if to_id.is_empty() || to_id == self.user_id {
            tracing::debug!(to = %to_id, "ignoring friend request to self or empty id");
            return;
        }
        // The token removes to_id from the pending set on every exit path.
        let Some(_token) = self.pending.begin(to_id) else {
            tracing::debug!(to = %to_id, "operation already in flight — ignoring send");
            return;
        };

        // A failed existence check is logged and treated as "no row": the
        // next wholesale load re-derives ground truth either way.
        match self.store.request_between(&self.user_id, to_id).await {
            Ok(Some(existing)) => {
                let state = if existing.from_user_id == self.user_id {
                    RelationshipState::Requested
                } else {
                    // Their request reached the store first — reinterpret
                    // this send as evidence of a pending incoming request.
                    RelationshipState::Incoming
                };
                self.index.write().set_state(to_id, state);
                return;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(to = %to_id, error = %e, "failed to check existing requests"),
        }

        match self.store.friendship_between(&self.user_id, to_id).await {
            Ok(Some(_)) => {
                self.index
                    .write()
                    .set_state(to_id, RelationshipState::Friends);
                return;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(to = %to_id, error = %e, "failed to check existing friendship");
            }
        }

        match self.store.insert_request(&self.user_id, to_id).await {
            Ok(_) => {
                self.index
                    .write()
                    .set_state(to_id, RelationshipState::Requested);
                self.bus.notify(NoticeKind::Success, "Friend request sent");
            }
            Err(e) => {
                tracing::warn!(to = %to_id, error = %e, "failed to create friend request");
                self.bus
                    .notify(NoticeKind::Error, "Failed to send friend request");
            }
        }
    }

    /// Accept the incoming request from `from_id`.
    ///
    /// The friendship is inserted before the request is deleted: a failed
    /// insert aborts and leaves the request intact so the accept is
    /// retryable, while a failed delete is tolerated — the duplicate
    /// guard in `send` and the next wholesale load keep state sane.
    pub async fn accept_request(&self, from_id: &str) {
        if from_id.is_empty() || from_id == self.user_id {
            tracing::debug!(from = %from_id, "ignoring accept for self or empty id");
            return;
        }
        let Some(_token) = self.pending.begin(from_id) else {
            tracing::debug!(from = %from_id, "operation already in flight — ignoring accept");
            return;
        };

        let request = match self.store.request_from_to(from_id, &self.user_id).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(from = %from_id, error = %e, "failed to look up incoming request");
                self.bus.notify(NoticeKind::Error, "Failed to accept request");
                return;
            }
        };
        if request.is_none() {
            // Tolerated: another session may have removed the row already.
            tracing::warn!(from = %from_id, "accepting without a stored request row");
        }

        if let Err(e) = self.store.insert_friendship(&self.user_id, from_id).await {
            tracing::warn!(from = %from_id, error = %e, "failed to create friendship");
            self.bus.notify(NoticeKind::Error, "Failed to accept request");
            return;
        }

        if let Some(request) = request {
            // Best-effort: the friendship already exists either way.
            if let Err(e) = self.store.delete_request(&request.id).await {
                tracing::warn!(
                    request_id = %request.id,
                    error = %e,
                    "failed to delete accepted request"
                );
            }
        }

        {
            let mut index = self.index.write();
            index.set_state(from_id, RelationshipState::Friends);
            if let Some(entry) = index.take_incoming_from(from_id) {
                index.push_friend(entry.profile);
            }
        }
        self.bus
            .notify(NoticeKind::Success, "Friend request accepted");
    }

    /// Decline the incoming request `request_id`. When `from_id` is not
    /// supplied it is resolved from the cached incoming list.
    pub async fn decline_request(&self, request_id: &str, from_id: Option<&str>) {
        if request_id.is_empty() {
            return;
        }
        let sender: Option<UserId> = match from_id {
            Some(id) => Some(id.to_string()),
            None => self.index.read().incoming_sender(request_id),
        };
        let _token = match &sender {
            Some(id) => match self.pending.begin(id) {
                Some(token) => Some(token),
                None => {
                    tracing::debug!(from = %id, "operation already in flight — ignoring decline");
                    return;
                }
            },
            None => None,
        };

        match self.store.delete_request(request_id).await {
            Ok(_) => {
                {
                    let mut index = self.index.write();
                    if let Some(id) = &sender {
                        index.clear_state(id);
                    }
                    index.remove_incoming_by_request(request_id);
                }
                self.bus
                    .notify(NoticeKind::Success, "Friend request declined");
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "failed to decline request");
                self.bus
                    .notify(NoticeKind::Error, "Failed to decline request");
            }
        }
    }

    // ── Read-only snapshots ─────────────────────────────────────────

    /// Latest search results.
    pub fn results(&self) -> Vec<Profile> {
        self.results.read().clone()
    }

    /// Whether a search is currently in flight.
    pub fn is_fetching(&self) -> bool {
        *self.fetching.read()
    }

    /// Counterpart ids with a mutating operation in flight.
    pub fn pending_ids(&self) -> HashSet<UserId> {
        self.pending.snapshot()
    }

    pub fn is_pending(&self, id: &str) -> bool {
        self.pending.is_pending(id)
    }

    /// Relationship with `id`; `None` means no relationship.
    pub fn state_of(&self, id: &str) -> Option<RelationshipState> {
        self.index.read().state_of(id)
    }

    /// Full per-counterpart state map.
    pub fn states(&self) -> HashMap<UserId, RelationshipState> {
        self.index.read().states().clone()
    }

    /// Incoming requests with cached sender profiles.
    pub fn incoming_requests(&self) -> Vec<IncomingRequest> {
        self.index.read().incoming().to_vec()
    }

    /// Friends with cached profiles.
    pub fn friends(&self) -> Vec<Profile> {
        self.index.read().friends().to_vec()
    }
}
