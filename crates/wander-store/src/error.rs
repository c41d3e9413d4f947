use thiserror::Error;

/// Failures surfaced by a [`StoreBackend`](crate::StoreBackend).
///
/// Absence of matching rows is never an error — these cover the call
/// itself failing (network, query, constraint) or a row that cannot be
/// decoded into its typed form.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("insert failed: {0}")]
    Insert(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("row decode failed: {0}")]
    Decode(String),
}
