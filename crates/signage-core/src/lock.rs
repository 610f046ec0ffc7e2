//! Keyed mutual exclusion and read watermarks
//!
//! [`LockManager`] serializes every operation that shares a lock key. Waiters
//! are admitted in arrival order (`tokio::sync::Mutex` is fair), keys are
//! independent of each other, and a key's registry entry disappears as soon as
//! nobody holds or waits on it.
//!
//! Locks are not reentrant. Calling [`LockManager::with_lock`] for a key from
//! inside an operation already holding that key never completes.
//!
//! The manager also keeps a per-path "last read" watermark used for advisory
//! conflict detection. Watermarks are never persisted.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

type Queue = Arc<AsyncMutex<()>>;

/// Registry of named lock queues plus read watermarks
///
/// Create one per session and share it through an `Arc`.
#[derive(Debug, Default)]
pub struct LockManager {
    queues: Mutex<HashMap<String, Queue>>,
    watermarks: Mutex<HashMap<String, DateTime<Utc>>>,
}

/// One admitted (or waiting) holder of a key
///
/// Dropping the ticket releases the key and removes the registry entry when no
/// other holder or waiter references it. This runs on every exit path,
/// including errors, panics and dropped futures.
struct LockTicket<'a> {
    manager: &'a LockManager,
    key: String,
    queue: Queue,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for LockTicket<'_> {
    fn drop(&mut self) {
        // Release before touching the registry
        self.guard.take();

        let mut queues = self.manager.queues();
        if let Some(current) = queues.get(&self.key)
            && Arc::ptr_eq(current, &self.queue)
            && Arc::strong_count(&self.queue) == 2
        {
            queues.remove(&self.key);
            trace!(key = %self.key, "Lock registry entry removed");
        }
    }
}

impl LockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `operation` while holding `key`
    ///
    /// Waits for every earlier holder of `key` to finish (successfully or
    /// not), runs the operation, releases the key, and returns the
    /// operation's output unchanged. Acquisition itself never fails.
    pub async fn with_lock<T, F, Fut>(&self, key: &str, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.acquire(key).await;
        trace!(key, "Lock acquired");
        let output = operation().await;
        drop(ticket);
        trace!(key, "Lock released");
        output
    }

    /// Number of keys currently held or awaited
    pub fn active_keys(&self) -> usize {
        self.queues().len()
    }

    /// Remember that this session read `path` just now
    pub fn record_read_timestamp(&self, path: &str) {
        self.record_read_timestamp_at(path, Utc::now());
    }

    /// Remember that this session read `path` at `at`
    pub fn record_read_timestamp_at(&self, path: &str, at: DateTime<Utc>) {
        self.watermarks().insert(path.to_string(), at);
    }

    /// Whether `last_modified` is newer than this session's last read of `path`
    ///
    /// Advisory only. A missing watermark or a missing hint is never a conflict.
    pub fn check_for_conflicts(&self, path: &str, last_modified: Option<DateTime<Utc>>) -> bool {
        let Some(last_modified) = last_modified else {
            return false;
        };
        match self.watermarks().get(path) {
            Some(last_read) => last_modified > *last_read,
            None => false,
        }
    }

    /// Drop the watermark for one path
    pub fn forget(&self, path: &str) {
        self.watermarks().remove(path);
    }

    /// Drop every watermark
    pub fn clear_timestamps(&self) {
        self.watermarks().clear();
    }

    async fn acquire(&self, key: &str) -> LockTicket<'_> {
        let queue = Arc::clone(self.queues().entry(key.to_string()).or_default());

        // The ticket exists before the wait so a dropped waiter still cleans up
        let mut ticket = LockTicket {
            manager: self,
            key: key.to_string(),
            queue,
            guard: None,
        };
        ticket.guard = Some(Arc::clone(&ticket.queue).lock_owned().await);
        ticket
    }

    fn queues(&self) -> MutexGuard<'_, HashMap<String, Queue>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn watermarks(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.watermarks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_with_lock_returns_output() {
        let locks = LockManager::new();
        let value = locks.with_lock("layouts-index", || async { 42 }).await;
        assert_eq!(value, 42);
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_with_lock_propagates_error_and_releases() {
        let locks = LockManager::new();
        let result: Result<(), String> = locks
            .with_lock("contents-index", || async { Err("disk full".to_string()) })
            .await;
        assert_eq!(result, Err("disk full".to_string()));
        assert_eq!(locks.active_keys(), 0);

        // Key is usable again
        let again = locks.with_lock("contents-index", || async { "ok" }).await;
        assert_eq!(again, "ok");
    }

    #[tokio::test]
    async fn test_same_key_is_serialized_in_arrival_order() {
        let locks = Arc::new(LockManager::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..5 {
            let locks = Arc::clone(&locks);
            let log = Arc::clone(&log);
            let in_flight = Arc::clone(&in_flight);
            handles.push(tokio::spawn(async move {
                locks
                    .with_lock("playlists-index", || async {
                        assert_eq!(in_flight.fetch_add(1, Ordering::SeqCst), 0);
                        log.lock().unwrap().push(format!("start-{i}"));
                        sleep(std::time::Duration::from_millis(5)).await;
                        log.lock().unwrap().push(format!("end-{i}"));
                        in_flight.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
            }));
            // Let the task register before spawning the next one
            sleep(std::time::Duration::from_millis(1)).await;
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let log = log.lock().unwrap();
        let expected: Vec<String> = (0..5)
            .flat_map(|i| [format!("start-{i}"), format!("end-{i}")])
            .collect();
        assert_eq!(*log, expected);
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = Arc::new(LockManager::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let holder = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                locks
                    .with_lock("layouts-index", move || async move {
                        // Held until the other key has run
                        rx.await.unwrap();
                    })
                    .await;
            })
        };

        sleep(std::time::Duration::from_millis(5)).await;
        locks
            .with_lock("schedules-index", move || async move {
                tx.send(()).unwrap();
            })
            .await;
        holder.await.unwrap();
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_leak_key() {
        let locks = Arc::new(LockManager::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        let holder = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                locks
                    .with_lock("contents-index", move || async move { rx.await.unwrap() })
                    .await;
            })
        };
        sleep(std::time::Duration::from_millis(5)).await;

        let waiter = tokio::time::timeout(
            std::time::Duration::from_millis(5),
            locks.with_lock("contents-index", || async {}),
        )
        .await;
        assert!(waiter.is_err());

        tx.send(()).unwrap();
        holder.await.unwrap();
        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_panicking_operation_releases_key() {
        let locks = Arc::new(LockManager::new());
        let task = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                locks
                    .with_lock("layouts-index", || async {
                        let fail = true;
                        if fail {
                            panic!("operation failed");
                        }
                        7
                    })
                    .await
            })
        };
        assert!(task.await.is_err());
        assert_eq!(locks.active_keys(), 0);
        assert_eq!(locks.with_lock("layouts-index", || async { 1 }).await, 1);
    }

    #[test]
    fn test_conflict_requires_watermark_and_hint() {
        let locks = LockManager::new();
        let now = Utc::now();

        assert!(!locks.check_for_conflicts("/layouts/layout-1.json", Some(now)));

        locks.record_read_timestamp_at("/layouts/layout-1.json", now);
        assert!(!locks.check_for_conflicts("/layouts/layout-1.json", None));
        assert!(!locks.check_for_conflicts("/layouts/layout-1.json", Some(now)));
        assert!(!locks.check_for_conflicts(
            "/layouts/layout-1.json",
            Some(now - Duration::seconds(1))
        ));
        assert!(locks.check_for_conflicts(
            "/layouts/layout-1.json",
            Some(now + Duration::seconds(1))
        ));
    }

    #[test]
    fn test_forget_and_clear() {
        let locks = LockManager::new();
        let now = Utc::now();
        let later = Some(now + Duration::seconds(5));

        locks.record_read_timestamp_at("a", now);
        locks.record_read_timestamp_at("b", now);
        locks.forget("a");
        assert!(!locks.check_for_conflicts("a", later));
        assert!(locks.check_for_conflicts("b", later));

        locks.clear_timestamps();
        assert!(!locks.check_for_conflicts("b", later));
    }
}
