//! In-memory verification store
//!
//! Keeps records, failure counters and locks in process memory behind one
//! async mutex, so every operation (in particular `take`) is atomic with
//! respect to the others. Pending codes do not survive a restart.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use sv_core::domain::entities::VerificationRecord;
use sv_core::services::verification::{codes_match, AttemptTracker, VerificationStore};

#[derive(Debug, Clone, Copy)]
struct FailureWindow {
    count: u32,
    resets_at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    /// Outstanding records keyed by email
    records: HashMap<String, Vec<VerificationRecord>>,
    failures: HashMap<String, FailureWindow>,
    /// Lock expiry per email
    locks: HashMap<String, DateTime<Utc>>,
}

/// Process-local verification store and attempt tracker
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    /// How long expired records are kept before the sweeper evicts them
    expired_retention: Duration,
}

impl MemoryStore {
    pub fn new(expired_retention: Duration) -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            expired_retention,
        }
    }

    /// Number of records currently held, expired ones included
    pub async fn record_count(&self) -> usize {
        self.state.lock().await.records.values().map(Vec::len).sum()
    }

    /// Evict records past their retention along with elapsed counters and locks
    ///
    /// Returns the number of records evicted.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let retention = self.expired_retention;
        let mut state = self.state.lock().await;

        let mut evicted = 0;
        state.records.retain(|_, records| {
            let before = records.len();
            records.retain(|record| !record.is_evictable_at(now, retention));
            evicted += before - records.len();
            !records.is_empty()
        });
        state.failures.retain(|_, window| window.resets_at > now);
        state.locks.retain(|_, until| *until > now);

        evicted
    }

    /// Run `sweep` every `every` until the store is dropped
    pub fn spawn_sweeper(self: &Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);

        tokio::spawn(async move {
            info!(
                interval_ms = every.as_millis() as u64,
                "Verification store sweeper started"
            );
            let mut interval_timer = tokio::time::interval(every);

            loop {
                interval_timer.tick().await;

                let Some(store) = weak.upgrade() else {
                    debug!("Verification store dropped, sweeper exiting");
                    break;
                };

                let evicted = store.sweep().await;
                if evicted > 0 {
                    debug!(evicted = evicted, "Evicted expired verification records");
                }
            }
        })
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn insert(&self, record: VerificationRecord) -> Result<(), String> {
        let mut state = self.state.lock().await;
        let records = state.records.entry(record.email.clone()).or_default();
        records.retain(|existing| existing.code != record.code);
        records.push(record);
        Ok(())
    }

    async fn take(&self, email: &str, code: &str) -> Result<Option<VerificationRecord>, String> {
        let mut state = self.state.lock().await;

        let Some(records) = state.records.get_mut(email) else {
            return Ok(None);
        };
        let taken = records
            .iter()
            .position(|record| codes_match(&record.code, code))
            .map(|index| records.remove(index));

        if records.is_empty() {
            state.records.remove(email);
        }
        Ok(taken)
    }

    async fn remove_all(&self, email: &str) -> Result<u64, String> {
        let mut state = self.state.lock().await;
        Ok(state
            .records
            .remove(email)
            .map(|records| records.len() as u64)
            .unwrap_or(0))
    }

    async fn replace_all(&self, record: VerificationRecord) -> Result<u64, String> {
        let mut state = self.state.lock().await;
        let removed = state
            .records
            .insert(record.email.clone(), vec![record])
            .map(|records| records.len() as u64)
            .unwrap_or(0);
        Ok(removed)
    }

    async fn latest_issued_at(&self, email: &str) -> Result<Option<DateTime<Utc>>, String> {
        let state = self.state.lock().await;
        Ok(state
            .records
            .get(email)
            .and_then(|records| records.iter().map(|record| record.issued_at).max()))
    }
}

#[async_trait]
impl AttemptTracker for MemoryStore {
    async fn record_failure(&self, email: &str, window: Duration) -> Result<u32, String> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        let entry = state
            .failures
            .entry(email.to_string())
            .and_modify(|current| {
                if current.resets_at > now {
                    current.count += 1;
                } else {
                    *current = FailureWindow {
                        count: 1,
                        resets_at: now + window,
                    };
                }
            })
            .or_insert(FailureWindow {
                count: 1,
                resets_at: now + window,
            });

        Ok(entry.count)
    }

    async fn clear_failures(&self, email: &str) -> Result<(), String> {
        self.state.lock().await.failures.remove(email);
        Ok(())
    }

    async fn lock(&self, email: &str, duration: Duration) -> Result<(), String> {
        self.state
            .lock()
            .await
            .locks
            .insert(email.to_string(), Utc::now() + duration);
        Ok(())
    }

    async fn lock_remaining(&self, email: &str) -> Result<Option<i64>, String> {
        let now = Utc::now();
        let mut state = self.state.lock().await;

        match state.locks.get(email).copied() {
            Some(until) if until > now => {
                let millis = (until - now).num_milliseconds();
                Ok(Some((millis + 999) / 1000))
            }
            Some(_) => {
                state.locks.remove(email);
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    const EMAIL: &str = "survivor@example.com";

    fn store() -> MemoryStore {
        MemoryStore::new(Duration::seconds(600))
    }

    fn record(code: &str) -> VerificationRecord {
        VerificationRecord::new(EMAIL, code, Duration::seconds(120))
    }

    #[tokio::test]
    async fn test_take_removes_record() {
        let store = store();
        store.insert(record("AB12CD")).await.unwrap();

        let taken = store.take(EMAIL, "AB12CD").await.unwrap();
        assert_eq!(taken.map(|r| r.code), Some("AB12CD".to_string()));
        assert!(store.take(EMAIL, "AB12CD").await.unwrap().is_none());
        assert_eq!(store.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_take_requires_matching_email_and_code() {
        let store = store();
        store.insert(record("AB12CD")).await.unwrap();

        assert!(store.take("other@example.com", "AB12CD").await.unwrap().is_none());
        assert!(store.take(EMAIL, "ZZ99ZZ").await.unwrap().is_none());
        assert!(store.take(EMAIL, "ab12cd").await.unwrap().is_none());
        assert_eq!(store.record_count().await, 1);
    }

    #[tokio::test]
    async fn test_insert_replaces_same_code() {
        let store = store();
        store.insert(record("AB12CD")).await.unwrap();
        store.insert(record("AB12CD")).await.unwrap();
        store.insert(record("XY34ZW")).await.unwrap();

        assert_eq!(store.record_count().await, 2);
    }

    #[tokio::test]
    async fn test_remove_all_and_latest_issued_at() {
        let store = store();
        let older = VerificationRecord::issued_at(
            EMAIL,
            "AB12CD",
            Utc::now() - Duration::seconds(30),
            Duration::seconds(120),
        );
        let newer = record("XY34ZW");
        let newest_issued = newer.issued_at;

        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();
        assert_eq!(store.latest_issued_at(EMAIL).await.unwrap(), Some(newest_issued));

        assert_eq!(store.remove_all(EMAIL).await.unwrap(), 2);
        assert_eq!(store.remove_all(EMAIL).await.unwrap(), 0);
        assert_eq!(store.latest_issued_at(EMAIL).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_window_resets() {
        let store = store();
        let window = Duration::milliseconds(50);

        assert_eq!(store.record_failure(EMAIL, window).await.unwrap(), 1);
        assert_eq!(store.record_failure(EMAIL, window).await.unwrap(), 2);

        tokio::time::sleep(StdDuration::from_millis(80)).await;
        assert_eq!(store.record_failure(EMAIL, window).await.unwrap(), 1);

        store.clear_failures(EMAIL).await.unwrap();
        assert_eq!(store.record_failure(EMAIL, window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lock_and_expiry() {
        let store = store();
        assert_eq!(store.lock_remaining(EMAIL).await.unwrap(), None);

        store.lock(EMAIL, Duration::seconds(900)).await.unwrap();
        let remaining = store.lock_remaining(EMAIL).await.unwrap().unwrap();
        assert!(remaining > 0 && remaining <= 900);

        store.lock(EMAIL, Duration::milliseconds(30)).await.unwrap();
        tokio::time::sleep(StdDuration::from_millis(60)).await;
        assert_eq!(store.lock_remaining(EMAIL).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sweep_respects_retention() {
        let retained = MemoryStore::new(Duration::seconds(600));
        let evicting = MemoryStore::new(Duration::zero());
        for store in [&retained, &evicting] {
            store
                .insert(VerificationRecord::new(EMAIL, "AB12CD", Duration::zero()))
                .await
                .unwrap();
        }

        tokio::time::sleep(StdDuration::from_millis(20)).await;

        assert_eq!(retained.sweep().await, 0);
        assert_eq!(retained.record_count().await, 1);
        assert_eq!(evicting.sweep().await, 1);
        assert_eq!(evicting.record_count().await, 0);
    }

    #[tokio::test]
    async fn test_sweeper_task_evicts_and_stops() {
        let store = Arc::new(MemoryStore::new(Duration::zero()));
        store
            .insert(VerificationRecord::new(EMAIL, "AB12CD", Duration::zero()))
            .await
            .unwrap();

        let handle = store.spawn_sweeper(StdDuration::from_millis(10));
        tokio::time::sleep(StdDuration::from_millis(60)).await;
        assert_eq!(store.record_count().await, 0);

        drop(store);
        tokio::time::timeout(StdDuration::from_secs(1), handle)
            .await
            .expect("sweeper should exit once the store is dropped")
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_take_yields_one_record() {
        let store = Arc::new(store());
        store.insert(record("AB12CD")).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.take(EMAIL, "AB12CD").await.unwrap() })
            })
            .collect();

        let mut taken = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                taken += 1;
            }
        }
        assert_eq!(taken, 1);
    }

    #[tokio::test]
    async fn test_replace_all_keeps_only_new_record() {
        let store = store();
        store.insert(record("AB12CD")).await.unwrap();
        store.insert(record("EF34GH")).await.unwrap();

        assert_eq!(store.replace_all(record("JK56LM")).await.unwrap(), 2);
        assert!(store.take(EMAIL, "AB12CD").await.unwrap().is_none());
        assert_eq!(store.record_count().await, 1);
        assert_eq!(store.replace_all(record("NP78QR")).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_replace_all_leaves_one_record() {
        let store = Arc::new(store());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                let code = format!("CODE{:02}", i);
                tokio::spawn(async move { store.replace_all(record(&code)).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.record_count().await, 1);
    }
}
