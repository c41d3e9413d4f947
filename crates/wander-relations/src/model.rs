use serde::{Deserialize, Serialize};

/// Opaque stable user identifier, unique per profile.
pub type UserId = String;

/// Identity visible in search results and friend lists.
///
/// Owned by the external identity component; immutable from this
/// subsystem's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
}

/// Status of a stored friend request.
///
/// Only `pending` is ever written: accepted and declined requests are
/// deleted, not transitioned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending,
}

/// Directed edge: a pending proposal from one user to another.
///
/// At most one active request may exist between any unordered pair; the
/// store does not enforce that symmetric uniqueness, the controller does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub id: String,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub status: RequestStatus,
    /// UNIX millis.
    pub created_at: i64,
}

/// Undirected edge stored as an ordered pair. Created only by an accept,
/// never mutated; unfriending is out of scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Friendship {
    pub id: String,
    pub user_id_1: UserId,
    pub user_id_2: UserId,
}

impl Friendship {
    /// The side of the pair that is not `user`.
    pub fn counterpart(&self, user: &str) -> &UserId {
        if self.user_id_1 == user {
            &self.user_id_2
        } else {
            &self.user_id_1
        }
    }
}

/// Relationship with a counterpart, from the current user's point of view.
///
/// "None" is the absence of an entry in the index; at most one of these
/// holds per counterpart at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipState {
    /// Current user sent a request, awaiting the counterpart.
    Requested,
    /// Counterpart sent a request, awaiting the current user.
    Incoming,
    /// Accepted. Terminal for this subsystem.
    Friends,
}

/// An incoming request with the sender's profile cached alongside, so the
/// request list renders without a second round trip per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingRequest {
    pub request_id: String,
    pub profile: Profile,
}
