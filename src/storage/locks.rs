//! Per-domain serialization of reconciliation passes.
//!
//! Two requests for the same domain would otherwise both see "no record" and
//! both insert, or race each other's server deletes. Each domain name maps to
//! an async mutex held for the whole lookup.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Table of per-domain locks. Cloning shares the table.
#[derive(Clone, Default)]
pub struct DomainLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl DomainLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other lookup of `domain` is running and returns a guard
    /// that keeps it that way until dropped.
    pub async fn acquire(&self, domain: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries referenced only by the map have no holder and no waiter
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(domain.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of domains currently tracked.
    #[cfg(test)]
    pub fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
