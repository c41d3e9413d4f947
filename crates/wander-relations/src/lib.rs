//! Relationship lifecycle engine for Wander.
//!
//! Wander lets a user record places visited and people met and share their
//! world map with friends. This crate owns the friend side of that:
//! username search, the per-counterpart relationship state projection, and
//! the send/accept/decline request lifecycle. All mutation of relationship
//! state enters through [`RelationshipController`]; the UI layer reads
//! snapshots and subscribes to [`EventBus`] notices.

pub mod controller;
pub mod debounce;
pub mod events;
pub mod index;
pub mod model;
pub mod pending;
pub mod search;
pub mod store;

pub use controller::RelationshipController;
pub use events::{EventBus, Notice, NoticeKind};
pub use index::RelationshipIndex;
pub use model::{
    FriendRequest, Friendship, IncomingRequest, Profile, RelationshipState, RequestStatus, UserId,
};
pub use pending::{PendingOps, PendingToken};
pub use search::{SearchEngine, DEBOUNCE_QUIET_PERIOD, RESULT_LIMIT};
pub use store::RelationshipStore;
