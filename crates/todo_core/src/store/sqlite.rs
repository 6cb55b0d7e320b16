//! SQLite-backed `KvStore`.
//!
//! # Invariants
//! - One connection per store, serialized behind a mutex.
//! - SQLite calls run on the blocking pool, never on an async worker thread.

use super::{KvStore, StorageError, StorageResult};
use crate::db::{open_db, open_db_in_memory};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Durable store persisting entries in the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKvStore {
    /// Opens the database at `path`, applying migrations.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already-migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    async fn with_conn<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StorageError::Unavailable("sqlite connection poisoned".to_string()))?;
            op(&guard)
        })
        .await
        .map_err(|err| StorageError::Task(err.to_string()))?
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            let value = conn
                .query_row(
                    "SELECT value FROM kv_entries WHERE key = ?1;",
                    [key.as_str()],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO kv_entries (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )?;
            Ok(())
        })
        .await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM kv_entries;", [])?;
            Ok(())
        })
        .await
    }
}
