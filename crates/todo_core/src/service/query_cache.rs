//! Read-through cache for presentation queries.
//!
//! # Responsibility
//! - Memoize `todos` and `todo:{id}` query results between mutations.
//! - Drop stale entries when the owning service reports a successful write.
//!
//! # Invariants
//! - The cache is an explicit value owned by its service; there is no
//!   process-wide instance.
//! - Entries are only replaced or removed, never partially mutated.
//! - Every invalidation bumps the generation; a fill tagged with an older
//!   generation is discarded.

use crate::model::todo::{Todo, TodoId};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Logical resource name of a cached query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Todos,
    Todo(TodoId),
}

impl Display for QueryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todos => write!(f, "todos"),
            Self::Todo(id) => write!(f, "todo:{id}"),
        }
    }
}

#[derive(Debug, Clone)]
enum CachedValue {
    Todos(Vec<Todo>),
    Todo(Option<Todo>),
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<QueryKey, CachedValue>,
    generation: u64,
}

impl CacheState {
    fn fill(&mut self, generation: u64, key: QueryKey, value: CachedValue) -> bool {
        if generation != self.generation {
            return false;
        }
        self.entries.insert(key, value);
        true
    }
}

/// In-process query cache with explicit invalidation.
#[derive(Debug, Default)]
pub struct TodoQueryCache {
    state: Mutex<CacheState>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl TodoQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn todos(&self) -> Option<Vec<Todo>> {
        match self.lookup(&QueryKey::Todos) {
            Some(CachedValue::Todos(todos)) => Some(todos),
            _ => None,
        }
    }

    /// Stores a list read that started at `generation`.
    ///
    /// Returns `false` and drops the value when an invalidation happened
    /// since, so a read racing a write cannot resurrect pre-write data.
    pub fn put_todos_if_current(&self, generation: u64, todos: Vec<Todo>) -> bool {
        self.state()
            .fill(generation, QueryKey::Todos, CachedValue::Todos(todos))
    }

    /// Outer `None` is a miss; inner `None` is a cached "not found".
    pub fn todo(&self, id: &str) -> Option<Option<Todo>> {
        match self.lookup(&QueryKey::Todo(id.to_string())) {
            Some(CachedValue::Todo(todo)) => Some(todo),
            _ => None,
        }
    }

    pub fn put_todo_if_current(&self, generation: u64, id: &str, todo: Option<Todo>) -> bool {
        self.state().fill(
            generation,
            QueryKey::Todo(id.to_string()),
            CachedValue::Todo(todo),
        )
    }

    /// Snapshot to pass back into `put_*_if_current` after a repository read.
    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    pub fn invalidate(&self, key: &QueryKey) {
        let mut state = self.state();
        state.generation += 1;
        state.entries.remove(key);
    }

    pub fn invalidate_all(&self) {
        let mut state = self.state();
        state.generation += 1;
        state.entries.clear();
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.state().entries.contains_key(key)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    fn lookup(&self, key: &QueryKey) -> Option<CachedValue> {
        let found = self.state().entries.get(key).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // Entries are whole values, so a poisoned map is still consistent.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
