//! Environment-driven configuration for the todo core.
//!
//! # Responsibility
//! - Resolve remote base URL, store location and repository tunables.
//! - Assemble a ready-to-use repository from resolved settings.
//!
//! # Invariants
//! - `base_url` is absolute http(s) without a trailing slash.
//! - Resolution never reads the process environment when driven through
//!   `from_lookup`.

use crate::remote::HttpTodoService;
use crate::repo::todo_repo::{
    MirroredTodoRepository, ReadFailurePolicy, RepoOptions, RepoResult, DEFAULT_SEED_LIMIT,
};
use crate::store::SqliteKvStore;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "TODO_BASE_URL";
pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
pub const ENV_SEED_LIMIT: &str = "TODO_SEED_LIMIT";
pub const ENV_READ_FAILURE_POLICY: &str = "TODO_READ_FAILURE_POLICY";
pub const ENV_HTTP_TIMEOUT_MS: &str = "TODO_HTTP_TIMEOUT_MS";

const DEFAULT_DB_FILE_NAME: &str = "todo_core.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "missing required setting `{key}`"),
            Self::Invalid { key, value } => write!(f, "invalid value `{value}` for `{key}`"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoConfig {
    pub base_url: String,
    pub db_path: PathBuf,
    pub seed_limit: usize,
    pub read_failure_policy: ReadFailurePolicy,
    pub http_timeout: Option<Duration>,
}

impl TodoConfig {
    /// Settings with defaults for everything except the remote URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            seed_limit: DEFAULT_SEED_LIMIT,
            read_failure_policy: ReadFailurePolicy::default(),
            http_timeout: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`, treating blank values as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = read(ENV_BASE_URL).ok_or(ConfigError::Missing(ENV_BASE_URL))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: ENV_BASE_URL,
                value: base_url,
            });
        }
        let mut config = Self::new(base_url);

        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = read(ENV_SEED_LIMIT) {
            config.seed_limit = raw.parse::<usize>().map_err(|_| ConfigError::Invalid {
                key: ENV_SEED_LIMIT,
                value: raw.clone(),
            })?;
        }
        if let Some(raw) = read(ENV_READ_FAILURE_POLICY) {
            config.read_failure_policy =
                ReadFailurePolicy::parse(&raw).ok_or_else(|| ConfigError::Invalid {
                    key: ENV_READ_FAILURE_POLICY,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = read(ENV_HTTP_TIMEOUT_MS) {
            let millis = raw
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: ENV_HTTP_TIMEOUT_MS,
                    value: raw.clone(),
                })?;
            config.http_timeout = Some(Duration::from_millis(millis));
        }

        Ok(config)
    }

    pub fn repo_options(&self) -> RepoOptions {
        RepoOptions {
            seed_limit: self.seed_limit,
            read_failure_policy: self.read_failure_policy,
        }
    }

    /// Opens the SQLite store at `db_path` and wires it to the HTTP remote.
    pub fn open_repository(&self) -> RepoResult<MirroredTodoRepository> {
        let store = SqliteKvStore::open(&self.db_path)?;
        let remote = match self.http_timeout {
            Some(timeout) => HttpTodoService::with_timeout(self.base_url.as_str(), timeout)?,
            None => HttpTodoService::new(self.base_url.as_str())?,
        };
        Ok(
            MirroredTodoRepository::new(Arc::new(store), Arc::new(remote))
                .with_options(self.repo_options()),
        )
    }
}
