//! Async boundary to Wander's persistent store.
//!
//! The real deployment talks to a remote relational store over a JSON wire.
//! This crate defines the slice of that API the rest of the app consumes:
//! a predicate AST ([`Filter`]), an async [`StoreBackend`] trait with
//! `select`/`insert`/`delete`, and an insertion-ordered in-memory backend
//! for tests and offline development.

pub mod backend;
pub mod error;
pub mod filter;
pub mod memory;

pub use backend::{Row, StoreBackend};
pub use error::StoreError;
pub use filter::Filter;
pub use memory::{MemoryBackend, Op};

/// Current UNIX timestamp in milliseconds.
pub fn timestamp_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}
