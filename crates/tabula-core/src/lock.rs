//! Per-relation schema locks.
//!
//! Binding a table may create or extend its relation. Two binders of the
//! same physical id must not interleave that step, but binders of different
//! tables proceed in parallel. `SchemaLockTable` holds one exclusive slot
//! per physical id; waiters park on a shared condition variable and give up
//! after a bounded wait.
//!
//! ```text
//!   bind(A) ──acquire(UT_A)──► held {UT_A}        ──drop──► {}
//!   bind(A) ──acquire(UT_A)──► wait ............... wake ──► held {UT_A}
//!   bind(B) ──acquire(UT_B)──► held {UT_A, UT_B}  (no wait)
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tabula_common::{PhysicalId, TabulaError, TabulaResult};
use tracing::debug;

/// Statistics about schema lock usage.
#[derive(Debug, Default)]
pub struct SchemaLockStats {
    /// Total lock acquisitions.
    pub acquisitions: AtomicU64,
    /// Acquisitions that had to wait for another holder.
    pub waits: AtomicU64,
    /// Acquisitions that gave up.
    pub timeouts: AtomicU64,
}

impl SchemaLockStats {
    /// Creates new stats.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_acquisition(&self) {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    fn record_wait(&self) {
        self.waits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }
}

/// Keyed mutual exclusion over physical relation names.
#[derive(Debug, Default)]
pub struct SchemaLockTable {
    /// Physical ids currently held.
    held: Mutex<HashSet<PhysicalId>>,
    /// Signalled whenever a lock is released.
    released: Condvar,
    /// Statistics.
    stats: SchemaLockStats,
}

impl SchemaLockTable {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `physical_id`, waiting at most `timeout`.
    ///
    /// The lock is released when the returned guard is dropped.
    pub fn acquire(
        &self,
        physical_id: &PhysicalId,
        timeout: Duration,
    ) -> TabulaResult<SchemaLockGuard<'_>> {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut held = self.held.lock();

        if held.contains(physical_id) {
            self.stats.record_wait();
            debug!(physical_id = %physical_id, "waiting for schema lock");

            while held.contains(physical_id) {
                if self.released.wait_until(&mut held, deadline).timed_out()
                    && held.contains(physical_id)
                {
                    self.stats.record_timeout();
                    return Err(TabulaError::SchemaLockTimeout {
                        physical_id: physical_id.to_string(),
                        waited_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                    });
                }
            }
        }

        held.insert(physical_id.clone());
        self.stats.record_acquisition();

        Ok(SchemaLockGuard {
            table: self,
            physical_id: physical_id.clone(),
        })
    }

    /// Returns true if `physical_id` is currently locked.
    pub fn is_held(&self, physical_id: &PhysicalId) -> bool {
        self.held.lock().contains(physical_id)
    }

    /// Returns the number of locks currently held.
    pub fn held_count(&self) -> usize {
        self.held.lock().len()
    }

    /// Returns the lock statistics.
    pub fn stats(&self) -> &SchemaLockStats {
        &self.stats
    }

    fn release(&self, physical_id: &PhysicalId) {
        self.held.lock().remove(physical_id);
        self.released.notify_all();
    }
}

/// Holds a schema lock until dropped.
pub struct SchemaLockGuard<'a> {
    table: &'a SchemaLockTable,
    physical_id: PhysicalId,
}

impl SchemaLockGuard<'_> {
    /// Returns the locked physical id.
    pub fn physical_id(&self) -> &PhysicalId {
        &self.physical_id
    }
}

impl Drop for SchemaLockGuard<'_> {
    fn drop(&mut self) {
        self.table.release(&self.physical_id);
    }
}

impl fmt::Debug for SchemaLockGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaLockGuard")
            .field("physical_id", &self.physical_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_acquire_and_release() {
        let table = SchemaLockTable::new();
        let id = PhysicalId::new("UT_A");

        {
            let guard = table.acquire(&id, Duration::from_millis(50)).unwrap();
            assert_eq!(guard.physical_id(), &id);
            assert!(table.is_held(&id));
            assert_eq!(table.held_count(), 1);
        }

        assert!(!table.is_held(&id));
        assert_eq!(table.held_count(), 0);
        assert_eq!(table.stats().acquisitions.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_different_ids_do_not_block() {
        let table = SchemaLockTable::new();
        let _a = table.acquire(&PhysicalId::new("UT_A"), Duration::from_millis(10)).unwrap();
        let _b = table.acquire(&PhysicalId::new("UT_B"), Duration::from_millis(10)).unwrap();
        assert_eq!(table.held_count(), 2);
        assert_eq!(table.stats().waits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_timeout() {
        let table = SchemaLockTable::new();
        let id = PhysicalId::new("UT_A");
        let _guard = table.acquire(&id, Duration::from_millis(10)).unwrap();

        let err = table.acquire(&id, Duration::from_millis(20)).unwrap_err();
        assert!(matches!(err, TabulaError::SchemaLockTimeout { .. }));
        assert!(err.is_retryable());
        assert_eq!(table.stats().timeouts.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_mutual_exclusion() {
        let table = Arc::new(SchemaLockTable::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let id = PhysicalId::new("UT_SHARED");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let table = Arc::clone(&table);
                let inside = Arc::clone(&inside);
                let id = id.clone();
                thread::spawn(move || {
                    let _guard = table.acquire(&id, Duration::from_secs(5)).unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    thread::sleep(Duration::from_millis(2));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.held_count(), 0);
        assert_eq!(table.stats().acquisitions.load(Ordering::Relaxed), 8);
    }
}
