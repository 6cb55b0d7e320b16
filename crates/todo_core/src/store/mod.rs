//! Durable key-value storage for the todo collection.
//!
//! # Responsibility
//! - Define the async `get/set/clear` contract the repository persists through.
//! - Provide SQLite-backed and in-memory implementations.
//!
//! # Invariants
//! - Values are opaque strings; encoding is owned by the caller.
//! - Every operation may fail with `StorageError`, including on reads.

use crate::db::DbError;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

pub type StorageResult<T> = Result<T, StorageError>;

/// Local persistence failure.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    /// The backing store refused the operation (e.g. disabled or poisoned).
    Unavailable(String),
    /// The blocking worker running the operation did not complete.
    Task(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
            Self::Task(reason) => write!(f, "storage task failed: {reason}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) | Self::Task(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Query(value))
    }
}

/// Async string key-value store.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    /// Removes every key, not only the todo collection.
    async fn clear(&self) -> StorageResult<()>;
}
