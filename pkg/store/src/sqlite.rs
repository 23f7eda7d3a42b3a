use std::{fs::create_dir_all, path::Path, sync::Mutex, time::Duration};

use rusqlite::{Connection, params};

use crate::{FingerprintStore, InsertAck, StoreError, StoredFingerprint};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_FINGERPRINTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS fingerprints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data TEXT NOT NULL
)";

/// SQLite-backed store holding the `fingerprints(id, data)` table.
///
/// One connection behind a mutex; each statement runs in SQLite's implicit
/// transaction, which is enough for a single insert or a single scan.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(CREATE_FINGERPRINTS_TABLE, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl FingerprintStore for SqliteStore {
    fn insert(&self, serialized_payload: &str) -> Result<InsertAck, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare_cached("INSERT INTO fingerprints (data) VALUES (?1)")?;
        stmt.execute(params![serialized_payload])?;
        Ok(InsertAck {
            id: conn.last_insert_rowid(),
        })
    }

    fn select_all(&self) -> Result<Vec<StoredFingerprint>, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let mut stmt = conn.prepare_cached("SELECT id, data FROM fingerprints ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredFingerprint {
                id: row.get(0)?,
                data: row.get(1)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}
