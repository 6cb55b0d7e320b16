//! Core data layer for the todo app.
//! Owns the local todo collection and its best-effort remote mirror.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod remote;
pub mod repo;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SteppingClock, SystemClock};
pub use config::{ConfigError, TodoConfig};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::todo::{
    new_todo_id, normalize_title, CreateTodoRequest, Priority, RemoteTodo, Todo, TodoId,
    TodoInput, TodoPatch, TodoValidationError,
};
pub use remote::{HttpTodoService, RemoteTodoService, TransportError, TransportResult};
pub use repo::todo_repo::{
    MirroredTodoRepository, ReadFailurePolicy, RepoError, RepoOptions, RepoResult,
    TodoRepository, DEFAULT_SEED_LIMIT, TODOS_STORAGE_KEY,
};
pub use service::query_cache::{QueryKey, TodoQueryCache};
pub use service::todo_service::{ServiceError, ServiceResult, TodoService};
pub use store::{KvStore, MemoryKvStore, SqliteKvStore, StorageError, StorageResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
