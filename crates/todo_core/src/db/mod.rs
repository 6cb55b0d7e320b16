//! SQLite bootstrap backing the durable key-value store.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections for the todo store.
//! - Apply schema migrations before any key-value access.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - A database written by a newer binary is refused, never downgraded.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while opening or migrating the todo store database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused the connection; `target` is the file path or `:memory:`.
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// A statement against an already open store failed.
    Query(rusqlite::Error),
    /// The file was last migrated by a newer build and is left untouched.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open todo store at {target}: {source}")
            }
            Self::Query(err) => write!(f, "todo store query failed: {err}"),
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "todo store schema v{found} comes from a newer build (this build reads up to v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::Query(err) => Some(err),
            Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Query(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    #[test]
    fn schema_too_new_names_both_versions() {
        let err = DbError::SchemaTooNew {
            found: 7,
            supported: 1,
        };
        assert_eq!(
            err.to_string(),
            "todo store schema v7 comes from a newer build (this build reads up to v1)"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn query_failure_keeps_sqlite_source() {
        let err = DbError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().starts_with("todo store query failed: "));
        assert!(err.source().is_some());
    }
}
