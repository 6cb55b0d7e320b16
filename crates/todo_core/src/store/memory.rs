use super::{KvStore, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Process-local store used by tests and ephemeral sessions.
///
/// `set_available(false)` makes every call fail with
/// `StorageError::Unavailable`, which lets callers exercise degraded paths.
#[derive(Debug)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
    available: AtomicBool,
    writes: AtomicUsize,
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of successful `set` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Synchronous peek for assertions.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(key).cloned())
    }

    fn entries(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory store disabled".to_string()));
        }
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.entries()?.clear();
        Ok(())
    }
}
