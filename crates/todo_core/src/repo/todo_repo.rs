//! Todo repository contract and the store-plus-remote implementation.
//!
//! # Responsibility
//! - Provide the six todo use-case operations over a local `KvStore`.
//! - Mirror writes to a `RemoteTodoService` on a best-effort basis.
//! - Apply the configured read failure policy to read paths.
//!
//! # Invariants
//! - The whole collection lives under `TODOS_STORAGE_KEY` as one JSON array.
//! - `list()` is ordered by `created_at` descending, newest insert first on ties.
//! - Mutations are serialized by a write gate held across their remote call
//!   and their load-modify-persist cycle, so concurrent adds cannot drop each
//!   other.
//! - Write paths always propagate errors; read paths degrade only under
//!   `ReadFailurePolicy::FailOpen`.

use crate::clock::{Clock, SystemClock};
use crate::model::todo::{CreateTodoRequest, RemoteTodo, Todo, TodoId, TodoInput, TodoPatch};
use crate::remote::{RemoteTodoService, TransportError};
use crate::store::{KvStore, StorageError};
use async_trait::async_trait;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

/// Store key holding the serialized todo collection.
pub const TODOS_STORAGE_KEY: &str = "@todos";
/// Number of remote seed items kept on first run.
pub const DEFAULT_SEED_LIMIT: usize = 10;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for todo reconciliation.
#[derive(Debug)]
pub enum RepoError {
    Transport(TransportError),
    Storage(StorageError),
    /// A mutation targeted an ID absent from the local collection.
    NotFound(TodoId),
    /// The stored collection blob is not a valid todo array.
    InvalidData(String),
}

impl RepoError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_failed",
            Self::Storage(_) => "storage_failed",
            Self::NotFound(_) => "not_found",
            Self::InvalidData(_) => "invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "todo not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid stored todo data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<TransportError> for RepoError {
    fn from(value: TransportError) -> Self {
        Self::Transport(value)
    }
}

impl From<StorageError> for RepoError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// What read paths do when the store or the remote fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadFailurePolicy {
    /// Log and return an empty collection / `None`.
    #[default]
    FailOpen,
    /// Log and return the error.
    FailClosed,
}

impl ReadFailurePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail_open" | "open" => Some(Self::FailOpen),
            "fail_closed" | "closed" => Some(Self::FailClosed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailOpen => "fail_open",
            Self::FailClosed => "fail_closed",
        }
    }
}

/// Tunables for `MirroredTodoRepository`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoOptions {
    pub seed_limit: usize,
    pub read_failure_policy: ReadFailurePolicy,
}

impl Default for RepoOptions {
    fn default() -> Self {
        Self {
            seed_limit: DEFAULT_SEED_LIMIT,
            read_failure_policy: ReadFailurePolicy::default(),
        }
    }
}

/// Repository interface for todo use-cases.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Returns the stored collection, seeding it from the remote on first run.
    async fn initialize(&self) -> RepoResult<Vec<Todo>>;
    /// Returns every todo, newest first.
    async fn list(&self) -> RepoResult<Vec<Todo>>;
    /// Local lookup with remote fallback; `None` when neither has it.
    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Todo>>;
    async fn add(&self, input: &TodoInput) -> RepoResult<Todo>;
    async fn update(&self, patch: &TodoPatch) -> RepoResult<Todo>;
    async fn toggle_completed(&self, id: &str) -> RepoResult<Todo>;
    /// Removing an unknown ID is a no-op.
    async fn remove(&self, id: &str) -> RepoResult<()>;
    /// Wipes local storage so the next `initialize()` reseeds.
    async fn reset(&self);
}

/// Repository that persists locally and mirrors writes to a remote.
pub struct MirroredTodoRepository {
    store: Arc<dyn KvStore>,
    remote: Arc<dyn RemoteTodoService>,
    clock: Arc<dyn Clock>,
    options: RepoOptions,
    write_gate: Mutex<()>,
}

impl MirroredTodoRepository {
    pub fn new(store: Arc<dyn KvStore>, remote: Arc<dyn RemoteTodoService>) -> Self {
        Self {
            store,
            remote,
            clock: Arc::new(SystemClock),
            options: RepoOptions::default(),
            write_gate: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_options(mut self, options: RepoOptions) -> Self {
        self.options = options;
        self
    }

    async fn load(&self) -> RepoResult<Option<Vec<Todo>>> {
        let Some(raw) = self.store.get(TODOS_STORAGE_KEY).await? else {
            return Ok(None);
        };
        serde_json::from_str::<Vec<Todo>>(&raw)
            .map(Some)
            .map_err(|err| RepoError::InvalidData(err.to_string()))
    }

    async fn load_or_empty(&self) -> RepoResult<Vec<Todo>> {
        Ok(self.load().await?.unwrap_or_default())
    }

    async fn persist(&self, todos: &[Todo]) -> RepoResult<()> {
        let raw = serde_json::to_string(todos)
            .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        self.store.set(TODOS_STORAGE_KEY, &raw).await?;
        Ok(())
    }

    async fn seed_from_remote(&self) -> RepoResult<Vec<Todo>> {
        let seed = self.remote.fetch_all().await?;
        let todos = seed
            .into_iter()
            .take(self.options.seed_limit)
            .map(|remote| {
                let mut todo = Todo::new(remote.title, self.clock.now());
                todo.completed = remote.completed;
                todo
            })
            .collect::<Vec<_>>();
        self.persist(&todos).await?;
        Ok(todos)
    }

    fn from_remote_fallback(&self, id: &str, remote: RemoteTodo) -> Todo {
        Todo {
            id: id.to_string(),
            title: remote.title,
            completed: remote.completed,
            priority: remote.priority.unwrap_or_default(),
            due_date: remote.due_date,
            created_at: remote.created_at.unwrap_or_else(|| self.clock.now()),
        }
    }

    /// Applies the read failure policy to a failed read.
    fn degrade<T>(
        &self,
        event: &str,
        started_at: Instant,
        err: RepoError,
        fallback: T,
    ) -> RepoResult<T> {
        let policy = self.options.read_failure_policy;
        error!(
            "event={event} module=repo status=error policy={} duration_ms={} error_code={} error={err}",
            policy.as_str(),
            started_at.elapsed().as_millis(),
            err.code()
        );
        match policy {
            ReadFailurePolicy::FailOpen => Ok(fallback),
            ReadFailurePolicy::FailClosed => Err(err),
        }
    }

    async fn update_unlocked(&self, patch: &TodoPatch) -> RepoResult<Todo> {
        self.remote.replace(patch).await?;

        let mut todos = self.load_or_empty().await?;
        let Some(existing) = todos.iter_mut().find(|todo| todo.id == patch.id) else {
            return Err(RepoError::NotFound(patch.id.clone()));
        };
        existing.apply_patch(patch);
        let updated = existing.clone();

        self.persist(&todos).await?;
        Ok(updated)
    }

    /// Looks the record up locally before mirroring, so a missing ID never
    /// reaches the remote.
    async fn toggle_unlocked(&self, id: &str) -> RepoResult<Todo> {
        let todos = self.load_or_empty().await?;
        let current = todos
            .iter()
            .find(|todo| todo.id == id)
            .ok_or_else(|| RepoError::NotFound(id.to_string()))?;
        let patch = TodoPatch::new(id).completed(!current.completed);
        self.update_unlocked(&patch).await
    }

    async fn append(&self, todo: &Todo) -> RepoResult<()> {
        let mut todos = self.load_or_empty().await?;
        todos.push(todo.clone());
        self.persist(&todos).await
    }

    /// Returns whether a record was actually dropped.
    async fn remove_unlocked(&self, id: &str) -> RepoResult<bool> {
        self.remote.delete(id).await?;

        let mut todos = self.load_or_empty().await?;
        let before = todos.len();
        todos.retain(|todo| todo.id != id);
        if todos.len() == before {
            return Ok(false);
        }
        self.persist(&todos).await?;
        Ok(true)
    }
}

#[async_trait]
impl TodoRepository for MirroredTodoRepository {
    async fn initialize(&self) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        let _gate = self.write_gate.lock().await;

        let result = match self.load().await {
            Ok(Some(todos)) => Ok((todos, "local")),
            Ok(None) => self.seed_from_remote().await.map(|todos| (todos, "remote")),
            Err(err) => Err(err),
        };

        match result {
            Ok((todos, source)) => {
                info!(
                    "event=todos_initialize module=repo status=ok source={source} count={} duration_ms={}",
                    todos.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(todos)
            }
            Err(err) => self.degrade("todos_initialize", started_at, err, Vec::new()),
        }
    }

    async fn list(&self) -> RepoResult<Vec<Todo>> {
        let started_at = Instant::now();
        match self.load_or_empty().await {
            Ok(mut todos) => {
                todos.reverse();
                todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(todos)
            }
            Err(err) => self.degrade("todos_list", started_at, err, Vec::new()),
        }
    }

    async fn get_by_id(&self, id: &str) -> RepoResult<Option<Todo>> {
        let started_at = Instant::now();
        match self.load_or_empty().await {
            Ok(todos) => {
                if let Some(todo) = todos.into_iter().find(|todo| todo.id == id) {
                    return Ok(Some(todo));
                }
            }
            Err(err) => {
                if self.options.read_failure_policy == ReadFailurePolicy::FailClosed {
                    return self.degrade("todo_get", started_at, err, None);
                }
                warn!(
                    "event=todo_get module=repo status=degraded stage=local error_code={} error={err}",
                    err.code()
                );
            }
        }

        match self.remote.fetch_one(id).await {
            Ok(remote) => {
                info!(
                    "event=todo_get module=repo status=ok source=remote duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(Some(self.from_remote_fallback(id, remote)))
            }
            Err(err) => self.degrade("todo_get", started_at, err.into(), None),
        }
    }

    async fn add(&self, input: &TodoInput) -> RepoResult<Todo> {
        let started_at = Instant::now();
        let _gate = self.write_gate.lock().await;

        let request = CreateTodoRequest {
            title: input.title.clone(),
            completed: false,
        };
        if let Err(err) = self.remote.create(&request).await {
            let err = RepoError::from(err);
            log_write_error("todo_add", started_at, &err);
            return Err(err);
        }

        let mut todo = Todo::new(input.title.clone(), self.clock.now());
        todo.priority = input.priority.unwrap_or_default();
        todo.due_date = input.due_date;

        match self.append(&todo).await {
            Ok(()) => {
                info!(
                    "event=todo_add module=repo status=ok priority={} duration_ms={}",
                    todo.priority.as_str(),
                    started_at.elapsed().as_millis()
                );
                Ok(todo)
            }
            Err(err) => {
                log_write_error("todo_add", started_at, &err);
                Err(err)
            }
        }
    }

    async fn update(&self, patch: &TodoPatch) -> RepoResult<Todo> {
        let started_at = Instant::now();
        let _gate = self.write_gate.lock().await;

        let result = self.update_unlocked(patch).await;
        log_write_outcome("todo_update", started_at, &result);
        result
    }

    async fn toggle_completed(&self, id: &str) -> RepoResult<Todo> {
        let started_at = Instant::now();
        let _gate = self.write_gate.lock().await;

        let result = self.toggle_unlocked(id).await;

        log_write_outcome("todo_toggle", started_at, &result);
        result
    }

    async fn remove(&self, id: &str) -> RepoResult<()> {
        let started_at = Instant::now();
        let _gate = self.write_gate.lock().await;

        match self.remove_unlocked(id).await {
            Ok(removed) => {
                info!(
                    "event=todo_remove module=repo status=ok removed={removed} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                log_write_error("todo_remove", started_at, &err);
                Err(err)
            }
        }
    }

    async fn reset(&self) {
        let _gate = self.write_gate.lock().await;
        match self.store.clear().await {
            Ok(()) => info!("event=store_reset module=repo status=ok"),
            Err(err) => error!(
                "event=store_reset module=repo status=error error_code=storage_failed error={err}"
            ),
        }
    }
}

fn log_write_outcome(event: &str, started_at: Instant, result: &RepoResult<Todo>) {
    match result {
        Ok(_) => info!(
            "event={event} module=repo status=ok duration_ms={}",
            started_at.elapsed().as_millis()
        ),
        Err(err) => log_write_error(event, started_at, err),
    }
}

fn log_write_error(event: &str, started_at: Instant, err: &RepoError) {
    if err.is_not_found() {
        warn!(
            "event={event} module=repo status=error duration_ms={} error_code=not_found",
            started_at.elapsed().as_millis()
        );
        return;
    }
    error!(
        "event={event} module=repo status=error duration_ms={} error_code={} error={err}",
        started_at.elapsed().as_millis(),
        err.code()
    );
}
