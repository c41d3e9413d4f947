//! Per-counterpart relationship projection.

use std::collections::HashMap;

use crate::model::{
    FriendRequest, Friendship, IncomingRequest, Profile, RelationshipState, UserId,
};
use crate::store::RelationshipStore;

/// In-memory projection of the current user's relationships: one state per
/// counterpart, the incoming-request list with cached sender profiles, and
/// the friends list.
///
/// Rebuilt wholesale by [`RelationshipIndex::build`] once per session (or
/// user change) and updated incrementally by the controller after each
/// mutation; the two paths must agree.
#[derive(Debug, Default, Clone)]
pub struct RelationshipIndex {
    states: HashMap<UserId, RelationshipState>,
    incoming: Vec<IncomingRequest>,
    friends: Vec<Profile>,
}

impl RelationshipIndex {
    /// Build the projection by reconciling outgoing requests, incoming
    /// requests, and friendships, in that order. Each step's load failure
    /// is caught and logged, leaving that portion empty rather than
    /// aborting the others.
    pub async fn build(store: &RelationshipStore, user: &str) -> Self {
        let mut index = Self::default();

        match store.requests_from(user).await {
            Ok(outgoing) => {
                for req in outgoing {
                    index
                        .states
                        .insert(req.to_user_id, RelationshipState::Requested);
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to load outgoing requests"),
        }

        match store.requests_to(user).await {
            Ok(incoming) => index.load_incoming(store, incoming).await,
            Err(e) => tracing::warn!(error = %e, "failed to load incoming requests"),
        }

        match store.friendships_of(user).await {
            Ok(friendships) => index.load_friends(store, user, friendships).await,
            Err(e) => tracing::warn!(error = %e, "failed to load friendships"),
        }

        index
    }

    async fn load_incoming(&mut self, store: &RelationshipStore, incoming: Vec<FriendRequest>) {
        for req in &incoming {
            self.states
                .insert(req.from_user_id.clone(), RelationshipState::Incoming);
        }

        let from_ids: Vec<UserId> = incoming.iter().map(|r| r.from_user_id.clone()).collect();
        let profiles = match store.profiles_by_ids(&from_ids).await {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load sender profiles");
                return;
            }
        };
        for profile in profiles {
            if let Some(req) = incoming.iter().find(|r| r.from_user_id == profile.id) {
                self.incoming.push(IncomingRequest {
                    request_id: req.id.clone(),
                    profile,
                });
            }
        }
    }

    async fn load_friends(
        &mut self,
        store: &RelationshipStore,
        user: &str,
        friendships: Vec<Friendship>,
    ) {
        let mut counterparts = Vec::with_capacity(friendships.len());
        for friendship in &friendships {
            let other = friendship.counterpart(user).clone();
            // A pair should never carry both a request and a friendship;
            // when the store disagrees, friends wins.
            if let Some(prior) = self.states.insert(other.clone(), RelationshipState::Friends) {
                if prior != RelationshipState::Friends {
                    tracing::warn!(
                        counterpart = %other,
                        ?prior,
                        "request and friendship both present for pair — keeping friends"
                    );
                }
            }
            counterparts.push(other);
        }

        match store.profiles_by_ids(&counterparts).await {
            Ok(profiles) => {
                for profile in profiles {
                    self.push_friend(profile);
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to load friend profiles"),
        }
    }

    // ── Read access ─────────────────────────────────────────────────

    /// Relationship with `id`; `None` is the implicit "no relationship".
    pub fn state_of(&self, id: &str) -> Option<RelationshipState> {
        self.states.get(id).copied()
    }

    pub fn states(&self) -> &HashMap<UserId, RelationshipState> {
        &self.states
    }

    pub fn incoming(&self) -> &[IncomingRequest] {
        &self.incoming
    }

    pub fn friends(&self) -> &[Profile] {
        &self.friends
    }

    /// Sender id cached for `request_id`, if any.
    pub fn incoming_sender(&self, request_id: &str) -> Option<UserId> {
        self.incoming
            .iter()
            .find(|r| r.request_id == request_id)
            .map(|r| r.profile.id.clone())
    }

    // ── Incremental mutators (controller only) ──────────────────────

    pub fn set_state(&mut self, id: &str, state: RelationshipState) {
        self.states.insert(id.to_string(), state);
    }

    /// Drop the entry for `id`, reverting it to the implicit none.
    pub fn clear_state(&mut self, id: &str) {
        self.states.remove(id);
    }

    /// Remove and return the incoming entry sent by `from_id`, if cached.
    pub fn take_incoming_from(&mut self, from_id: &str) -> Option<IncomingRequest> {
        let pos = self.incoming.iter().position(|r| r.profile.id == from_id)?;
        Some(self.incoming.remove(pos))
    }

    /// Remove the incoming entry for `request_id`, if cached.
    pub fn remove_incoming_by_request(&mut self, request_id: &str) {
        self.incoming.retain(|r| r.request_id != request_id);
    }

    /// Append to the friends list, deduplicated by id.
    pub fn push_friend(&mut self, profile: Profile) {
        if self.friends.iter().any(|p| p.id == profile.id) {
            return;
        }
        self.friends.push(profile);
    }
}
