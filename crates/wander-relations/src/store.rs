//! Typed thin interface over the persistent store.
//!
//! Exposes the four record kinds the engine touches — profiles, friend
//! requests, friendships, and the username search — as one backend call
//! per method. Owns no logic.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use wander_store::{timestamp_now, Filter, Row, StoreBackend, StoreError};

use crate::model::{FriendRequest, Friendship, Profile, RequestStatus, UserId};

pub(crate) const PROFILES: &str = "profiles";
pub(crate) const FRIEND_REQUESTS: &str = "friend_requests";
pub(crate) const FRIENDSHIPS: &str = "friendships";

/// Typed read/write operations over a [`StoreBackend`].
#[derive(Clone)]
pub struct RelationshipStore {
    backend: Arc<dyn StoreBackend>,
}

impl RelationshipStore {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    /// Case-insensitive username prefix search, excluding `exclude_id`.
    pub async fn search_profiles(
        &self,
        prefix: &str,
        exclude_id: &str,
        limit: usize,
    ) -> Result<Vec<Profile>, StoreError> {
        let filter = Filter::and([
            Filter::prefix("username", prefix),
            Filter::ne("id", exclude_id),
        ]);
        self.select(PROFILES, &filter, Some(limit)).await
    }

    pub async fn profiles_by_ids(&self, ids: &[UserId]) -> Result<Vec<Profile>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(PROFILES, &Filter::one_of("id", ids.to_vec()), None)
            .await
    }

    /// Requests sent by `user`.
    pub async fn requests_from(&self, user: &str) -> Result<Vec<FriendRequest>, StoreError> {
        self.select(FRIEND_REQUESTS, &Filter::eq("from_user_id", user), None)
            .await
    }

    /// Requests addressed to `user`.
    pub async fn requests_to(&self, user: &str) -> Result<Vec<FriendRequest>, StoreError> {
        self.select(FRIEND_REQUESTS, &Filter::eq("to_user_id", user), None)
            .await
    }

    /// The active request between `a` and `b`, in either direction.
    pub async fn request_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let filter = pair_filter("from_user_id", "to_user_id", a, b);
        Ok(self
            .select(FRIEND_REQUESTS, &filter, Some(1))
            .await?
            .into_iter()
            .next())
    }

    /// The request from `from` to `to`, if any.
    pub async fn request_from_to(
        &self,
        from: &str,
        to: &str,
    ) -> Result<Option<FriendRequest>, StoreError> {
        let filter = Filter::and([
            Filter::eq("from_user_id", from),
            Filter::eq("to_user_id", to),
        ]);
        Ok(self
            .select(FRIEND_REQUESTS, &filter, Some(1))
            .await?
            .into_iter()
            .next())
    }

    pub async fn insert_request(&self, from: &str, to: &str) -> Result<FriendRequest, StoreError> {
        let row = to_row(&serde_json::json!({
            "from_user_id": from,
            "to_user_id": to,
            "status": RequestStatus::Pending,
            "created_at": timestamp_now(),
        }))?;
        self.insert_one(FRIEND_REQUESTS, row).await
    }

    /// Delete a request by id. Zero rows removed is a success.
    pub async fn delete_request(&self, id: &str) -> Result<u64, StoreError> {
        self.backend
            .delete(FRIEND_REQUESTS, &Filter::eq("id", id))
            .await
    }

    /// Friendships where `user` is either side.
    pub async fn friendships_of(&self, user: &str) -> Result<Vec<Friendship>, StoreError> {
        let filter = Filter::or([Filter::eq("user_id_1", user), Filter::eq("user_id_2", user)]);
        self.select(FRIENDSHIPS, &filter, None).await
    }

    /// The friendship between `a` and `b`, in either direction.
    pub async fn friendship_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<Friendship>, StoreError> {
        let filter = pair_filter("user_id_1", "user_id_2", a, b);
        Ok(self
            .select(FRIENDSHIPS, &filter, Some(1))
            .await?
            .into_iter()
            .next())
    }

    pub async fn insert_friendship(&self, a: &str, b: &str) -> Result<Friendship, StoreError> {
        let row = to_row(&serde_json::json!({ "user_id_1": a, "user_id_2": b }))?;
        self.insert_one(FRIENDSHIPS, row).await
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<T>, StoreError> {
        let rows = self.backend.select(table, filter, limit).await?;
        rows.into_iter().map(from_row).collect()
    }

    async fn insert_one<T: DeserializeOwned>(
        &self,
        table: &str,
        row: Row,
    ) -> Result<T, StoreError> {
        let mut rows = self.backend.insert(table, vec![row]).await?;
        if rows.is_empty() {
            return Err(StoreError::Insert(format!("{table}: no row returned")));
        }
        from_row(rows.remove(0))
    }
}

/// OR-of-AND filter matching the unordered pair `{a, b}` on two columns.
fn pair_filter(col1: &str, col2: &str, a: &str, b: &str) -> Filter {
    Filter::or([
        Filter::and([Filter::eq(col1, a), Filter::eq(col2, b)]),
        Filter::and([Filter::eq(col1, b), Filter::eq(col2, a)]),
    ])
}

fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    serde_json::from_value(serde_json::Value::Object(row))
        .map_err(|e| StoreError::Decode(e.to_string()))
}

fn to_row(value: &serde_json::Value) -> Result<Row, StoreError> {
    match value {
        serde_json::Value::Object(map) => Ok(map.clone()),
        _ => Err(StoreError::Decode("expected a JSON object".into())),
    }
}
