#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use todo_core::{
    CreateTodoRequest, KvStore, MemoryKvStore, MirroredTodoRepository, ReadFailurePolicy,
    RemoteTodo, RemoteTodoService, RepoOptions, SteppingClock, StorageResult, TodoPatch,
    TransportError, TransportResult,
};

/// Memory store that hands control back to the scheduler after every call,
/// so load/modify/persist sequences of concurrent tasks interleave.
#[derive(Default)]
pub struct YieldingStore {
    inner: MemoryKvStore,
    yields_per_call: usize,
    slow_next_read: AtomicUsize,
}

impl YieldingStore {
    pub fn new(yields_per_call: usize) -> Self {
        Self {
            yields_per_call,
            ..Self::default()
        }
    }

    /// The next `get` returns its snapshot only after `extra` more yields.
    pub fn slow_down_next_read(&self, extra: usize) {
        self.slow_next_read.store(extra, Ordering::SeqCst);
    }

    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.inner.snapshot(key)
    }

    async fn yield_times(count: usize) {
        for _ in 0..count {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl KvStore for YieldingStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self.inner.get(key).await?;
        let extra = self.slow_next_read.swap(0, Ordering::SeqCst);
        Self::yield_times(self.yields_per_call + extra).await;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        Self::yield_times(self.yields_per_call).await;
        self.inner.set(key, value).await
    }

    async fn clear(&self) -> StorageResult<()> {
        Self::yield_times(self.yields_per_call).await;
        self.inner.clear().await
    }
}

/// In-process stand-in for the REST endpoint that records every call.
#[derive(Default)]
pub struct FakeRemote {
    seed: Vec<RemoteTodo>,
    items: Mutex<HashMap<String, RemoteTodo>>,
    failing: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn with_seed(count: usize) -> Self {
        let seed = (1..=count)
            .map(|n| RemoteTodo {
                id: n.to_string(),
                title: format!("seed item {n}"),
                completed: n % 2 == 0,
                priority: None,
                created_at: None,
                due_date: None,
            })
            .collect();
        Self {
            seed,
            ..Self::default()
        }
    }

    pub fn insert_item(&self, item: RemoteTodo) {
        self.items.lock().unwrap().insert(item.id.clone(), item);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(method))
            .count()
    }

    fn record(&self, call: String) -> TransportResult<()> {
        self.calls.lock().unwrap().push(call);
        if self.failing.load(Ordering::SeqCst) {
            return Err(TransportError::Request("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteTodoService for FakeRemote {
    async fn fetch_all(&self) -> TransportResult<Vec<RemoteTodo>> {
        self.record("GET /todos".to_string())?;
        Ok(self.seed.clone())
    }

    async fn fetch_one(&self, id: &str) -> TransportResult<RemoteTodo> {
        self.record(format!("GET /todos/{id}"))?;
        self.items
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(TransportError::Status {
                status: 404,
                url: format!("/todos/{id}"),
            })
    }

    async fn create(&self, request: &CreateTodoRequest) -> TransportResult<RemoteTodo> {
        self.record("POST /todos".to_string())?;
        Ok(RemoteTodo {
            id: "201".to_string(),
            title: request.title.clone(),
            completed: request.completed,
            priority: None,
            created_at: None,
            due_date: None,
        })
    }

    async fn replace(&self, patch: &TodoPatch) -> TransportResult<()> {
        self.record(format!("PUT /todos/{}", patch.id))
    }

    async fn delete(&self, id: &str) -> TransportResult<()> {
        self.record(format!("DELETE /todos/{id}"))
    }
}

/// Bundles a repository with handles to its collaborators.
pub struct Harness {
    pub repo: MirroredTodoRepository,
    pub store: Arc<MemoryKvStore>,
    pub remote: Arc<FakeRemote>,
}

pub fn harness(seed: usize) -> Harness {
    harness_with_policy(seed, ReadFailurePolicy::FailOpen)
}

pub fn harness_with_policy(seed: usize, policy: ReadFailurePolicy) -> Harness {
    let store = Arc::new(MemoryKvStore::new());
    let remote = Arc::new(FakeRemote::with_seed(seed));
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    let repo = MirroredTodoRepository::new(store.clone(), remote.clone())
        .with_clock(Arc::new(SteppingClock::new(start, Duration::seconds(1))))
        .with_options(RepoOptions {
            read_failure_policy: policy,
            ..RepoOptions::default()
        });
    Harness {
        repo,
        store,
        remote,
    }
}
