use async_trait::async_trait;

use crate::{Filter, StoreError};

/// A single record as it travels over the wire: a JSON object.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Async query/insert/delete surface of the persistent store.
///
/// Every call may fail with a [`StoreError`]; absence of matching rows is a
/// success with an empty vec, not an error. Row ids are assigned by the
/// store on insert, never by the caller.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Rows of `table` matching `filter`, in the store's default order,
    /// truncated to `limit` when given.
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Insert rows into `table`; returns them as stored, ids assigned.
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    /// Delete rows of `table` matching `filter`; returns how many were
    /// removed. Zero matches is a success.
    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError>;
}
