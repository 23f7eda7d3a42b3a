//! Append/read persistence for collected fingerprint payloads.
//!
//! Every row carries one opaque string column. Callers hand over an already
//! serialized payload; the store never inspects it.

mod sqlite;

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;

pub use sqlite::SqliteStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFingerprint {
    pub id: i64,
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertAck {
    pub id: i64,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// The gateway every handler talks to. A single `insert` or `select_all`
/// must be atomic on its own; no cross-call transaction is expected.
pub trait FingerprintStore: Send + Sync {
    fn insert(&self, serialized_payload: &str) -> Result<InsertAck, StoreError>;

    /// Full unfiltered scan, in the order the backend keeps rows.
    fn select_all(&self) -> Result<Vec<StoredFingerprint>, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<StoredFingerprint>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.rows()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<StoredFingerprint>>, StoreError> {
        self.rows.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl FingerprintStore for InMemoryStore {
    fn insert(&self, serialized_payload: &str) -> Result<InsertAck, StoreError> {
        let mut rows = self.rows()?;
        let id = rows.last().map(|row| row.id + 1).unwrap_or(1);
        rows.push(StoredFingerprint {
            id,
            data: serialized_payload.to_string(),
        });
        Ok(InsertAck { id })
    }

    fn select_all(&self) -> Result<Vec<StoredFingerprint>, StoreError> {
        Ok(self.rows()?.clone())
    }
}
