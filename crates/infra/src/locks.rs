//! Per-entity exclusive locks with bounded waits.
//!
//! Lock order across the engine is always: deal lock, then account locks in
//! ascending account id. Waiting longer than the configured timeout fails
//! with a retryable `Contention` error instead of blocking.

use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use closingdesk_core::{EngineError, EngineResult};

/// Set of currently held keys; waiters park on a shared condvar.
#[derive(Debug)]
pub struct LockTable<K> {
    name: &'static str,
    held: Mutex<HashSet<K>>,
    released: Condvar,
    timeout: Duration,
}

impl<K> LockTable<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub fn new(name: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            timeout,
        }
    }

    /// Acquire `key` exclusively, waiting at most the table timeout.
    pub fn acquire(&self, key: &K) -> EngineResult<LockGuard<'_, K>> {
        let deadline = Instant::now() + self.timeout;
        let mut held = self.held.lock();

        while held.contains(key) {
            if self.released.wait_until(&mut held, deadline).timed_out() && held.contains(key) {
                tracing::warn!(lock = self.name, key = %key, "lock wait timed out");
                return Err(EngineError::contention(format!(
                    "timed out waiting for {} lock on {key}",
                    self.name
                )));
            }
        }

        held.insert(key.clone());
        Ok(LockGuard {
            table: self,
            key: key.clone(),
        })
    }

    /// Acquire several keys in ascending order; all-or-nothing.
    pub fn acquire_ordered(&self, keys: &[K]) -> EngineResult<Vec<LockGuard<'_, K>>>
    where
        K: Ord,
    {
        let mut ordered: Vec<&K> = keys.iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            // Guards taken so far are released on early return.
            guards.push(self.acquire(key)?);
        }
        Ok(guards)
    }

    pub fn is_held(&self, key: &K) -> bool {
        self.held.lock().contains(key)
    }

    fn release(&self, key: &K) {
        let mut held = self.held.lock();
        held.remove(key);
        drop(held);
        self.released.notify_all();
    }
}

/// Releases its key on drop.
#[derive(Debug)]
pub struct LockGuard<'a, K>
where
    K: Eq + Hash + Clone + Display,
{
    table: &'a LockTable<K>,
    key: K,
}

impl<K> Drop for LockGuard<'_, K>
where
    K: Eq + Hash + Clone + Display,
{
    fn drop(&mut self) {
        self.table.release(&self.key);
    }
}
