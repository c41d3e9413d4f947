//! In-memory [`StoreBackend`] for tests and offline development.
//!
//! Data is lost on process exit. Mirrors the remote store's observable
//! behaviour: ids are assigned on insert, rows come back in insertion
//! order, and deleting nothing is a success.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::backend::{Row, StoreBackend};
use crate::{Filter, StoreError};

/// Which backend operation a [`MemoryBackend::fail_next`] fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Select,
    Insert,
    Delete,
}

/// Insertion-ordered in-memory store with one-shot fault injection and
/// per-operation call counters, so error paths and "did it hit the store
/// at all" assertions are testable without a network.
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    faults: Mutex<Vec<(Op, String)>>,
    selects: AtomicU64,
    inserts: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot failure for the next `op` on `table`.
    pub fn fail_next(&self, op: Op, table: &str) {
        self.faults.lock().push((op, table.to_string()));
    }

    fn take_fault(&self, op: Op, table: &str) -> bool {
        let mut faults = self.faults.lock();
        match faults.iter().position(|(o, t)| *o == op && t == table) {
            Some(pos) => {
                faults.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Number of `select` calls issued so far, including failed ones.
    pub fn select_count(&self) -> u64 {
        self.selects.load(Ordering::Relaxed)
    }

    pub fn insert_count(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    pub fn delete_count(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Snapshot of a table's rows, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl StoreBackend for MemoryBackend {
    async fn select(
        &self,
        table: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Row>, StoreError> {
        self.selects.fetch_add(1, Ordering::Relaxed);
        if self.take_fault(Op::Select, table) {
            return Err(StoreError::Query(format!("injected fault on {table}")));
        }
        let tables = self.tables.lock();
        let mut out: Vec<Row> = tables
            .get(table)
            .map(|rows| rows.iter().filter(|r| filter.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(limit) = limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        self.inserts.fetch_add(1, Ordering::Relaxed);
        if self.take_fault(Op::Insert, table) {
            return Err(StoreError::Insert(format!("injected fault on {table}")));
        }
        let mut tables = self.tables.lock();
        let stored = tables.entry(table.to_string()).or_default();
        let mut returned = Vec::with_capacity(rows.len());
        for mut row in rows {
            row.entry("id".to_string())
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            stored.push(row.clone());
            returned.push(row);
        }
        Ok(returned)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<u64, StoreError> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        if self.take_fault(Op::Delete, table) {
            return Err(StoreError::Delete(format!("injected fault on {table}")));
        }
        let mut tables = self.tables.lock();
        let Some(rows) = tables.get_mut(table) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !filter.matches(r));
        Ok((before - rows.len()) as u64)
    }
}
