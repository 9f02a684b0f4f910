use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Default bound on how long a request waits for its table's lock.
pub const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(10);

/// Hands out one lock per table name, shared by every handler built from it.
#[derive(Debug, Clone, Default)]
pub struct LockRegistry {
    locks: Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, table: &str, wait: Duration) -> AdvisoryLock {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let inner = locks
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        AdvisoryLock {
            table: table.to_string(),
            inner,
            wait,
        }
    }
}

/// Best-effort mutual exclusion over one table.
#[derive(Debug, Clone)]
pub struct AdvisoryLock {
    table: String,
    inner: Arc<Mutex<()>>,
    wait: Duration,
}

impl AdvisoryLock {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Waits up to the configured bound. Never fails: on timeout the lease
    /// comes back unsynchronized and the caller decides what to do.
    pub async fn acquire(&self) -> LockLease {
        match tokio::time::timeout(self.wait, self.inner.clone().lock_owned()).await {
            Ok(guard) => LockLease::Held(guard),
            Err(_) => LockLease::Unsynchronized,
        }
    }
}

/// Result of a lock attempt. Dropping a `Held` lease releases the lock.
#[derive(Debug)]
pub enum LockLease {
    Held(OwnedMutexGuard<()>),
    Unsynchronized,
}

impl LockLease {
    pub fn is_held(&self) -> bool {
        matches!(self, LockLease::Held(_))
    }
}
