//! Todo use-case service.
//!
//! # Responsibility
//! - Expose list/detail queries and mutations to UI and FFI callers.
//! - Reject blank titles before any repository call.
//! - Keep the query cache coherent with repository writes.
//!
//! # Invariants
//! - A successful write invalidates `todos` and the touched `todo:{id}`.
//! - A failed write leaves the cache untouched.
//! - A read that overlaps a write never fills the cache.

use crate::model::todo::{normalize_title, Todo, TodoInput, TodoPatch, TodoValidationError};
use crate::repo::todo_repo::{RepoError, TodoRepository};
use crate::service::query_cache::{QueryKey, TodoQueryCache};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for todo use-cases.
#[derive(Debug)]
pub enum ServiceError {
    InvalidTitle(TodoValidationError),
    Repo(RepoError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_not_found())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTitle(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<TodoValidationError> for ServiceError {
    fn from(value: TodoValidationError) -> Self {
        Self::InvalidTitle(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Cached use-case wrapper around a `TodoRepository`.
pub struct TodoService<R: TodoRepository> {
    repo: R,
    cache: TodoQueryCache,
}

impl<R: TodoRepository> TodoService<R> {
    pub fn new(repo: R, cache: TodoQueryCache) -> Self {
        Self { repo, cache }
    }

    pub fn cache(&self) -> &TodoQueryCache {
        &self.cache
    }

    /// Bootstraps storage and drops every cached query.
    pub async fn initialize(&self) -> ServiceResult<Vec<Todo>> {
        let todos = self.repo.initialize().await?;
        self.cache.invalidate_all();
        Ok(todos)
    }

    /// List query, newest first.
    pub async fn todos(&self) -> ServiceResult<Vec<Todo>> {
        if let Some(todos) = self.cache.todos() {
            return Ok(todos);
        }
        let generation = self.cache.generation();
        let todos = self.repo.list().await?;
        self.cache.put_todos_if_current(generation, todos.clone());
        Ok(todos)
    }

    /// Detail query.
    pub async fn todo(&self, id: &str) -> ServiceResult<Option<Todo>> {
        if let Some(todo) = self.cache.todo(id) {
            return Ok(todo);
        }
        let generation = self.cache.generation();
        let todo = self.repo.get_by_id(id).await?;
        self.cache.put_todo_if_current(generation, id, todo.clone());
        Ok(todo)
    }

    /// Creates a todo from form input; the title is trimmed.
    pub async fn create(&self, input: TodoInput) -> ServiceResult<Todo> {
        let input = TodoInput {
            title: normalize_title(&input.title)?,
            ..input
        };
        let todo = self.repo.add(&input).await?;
        self.invalidate_after_write(&todo.id);
        Ok(todo)
    }

    /// Applies an edit form; a present title must not be blank.
    pub async fn edit(&self, patch: TodoPatch) -> ServiceResult<Todo> {
        let title = match patch.title.as_deref() {
            Some(title) => Some(normalize_title(title)?),
            None => None,
        };
        let patch = TodoPatch { title, ..patch };
        let todo = self.repo.update(&patch).await?;
        self.invalidate_after_write(&todo.id);
        Ok(todo)
    }

    pub async fn toggle(&self, id: &str) -> ServiceResult<Todo> {
        let todo = self.repo.toggle_completed(id).await?;
        self.invalidate_after_write(id);
        Ok(todo)
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        self.repo.remove(id).await?;
        self.invalidate_after_write(id);
        Ok(())
    }

    /// Clears local storage and every cached query.
    pub async fn reset(&self) {
        self.repo.reset().await;
        self.cache.invalidate_all();
    }

    fn invalidate_after_write(&self, id: &str) {
        self.cache.invalidate(&QueryKey::Todos);
        self.cache.invalidate(&QueryKey::Todo(id.to_string()));
    }
}
