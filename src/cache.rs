//! Single-slot, time-bounded memoization of the source query.
//!
//! The slot holds `(snapshot, fetched_at)`. A snapshot is an
//! `Arc<Vec<ServiceOrderRecord>>` that is never mutated once published; a
//! refresh builds a new one and swaps it in. Callers that arrive while a
//! refresh is running wait on the slot and then see its outcome, so an
//! expired slot costs exactly one fetch.
//!
//! A failed fetch is memoized too: the empty snapshot and its error are
//! served until the TTL runs out or [`SnapshotCache::invalidate`] is called.
//!
//! `get_at` takes `now` explicitly so expiry is deterministic in tests.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::error::Result;
use crate::model::ServiceOrderRecord;
use crate::source::OrderSource;

/// How long a fetched snapshot is served before the source is queried again.
pub const CACHE_TTL: Duration = Duration::from_secs(600);

/// Result of a load: the snapshot plus the diagnostic of a failed fetch.
#[derive(Debug, Clone)]
pub struct LoadedOrders {
    pub records: Arc<Vec<ServiceOrderRecord>>,
    pub error: Option<String>,
}

impl LoadedOrders {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

struct CachedSnapshot {
    records: Arc<Vec<ServiceOrderRecord>>,
    error: Option<String>,
    fetched_at: Instant,
}

impl CachedSnapshot {
    fn is_fresh_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.fetched_at) < ttl
    }

    fn loaded(&self) -> LoadedOrders {
        LoadedOrders {
            records: Arc::clone(&self.records),
            error: self.error.clone(),
        }
    }
}

pub struct SnapshotCache {
    source: Arc<dyn OrderSource>,
    ttl: Duration,
    slot: Mutex<Option<CachedSnapshot>>,
}

impl SnapshotCache {
    pub fn new(source: Arc<dyn OrderSource>) -> Self {
        Self::with_ttl(source, CACHE_TTL)
    }

    pub fn with_ttl(source: Arc<dyn OrderSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached snapshot, fetching a new one if the slot is empty
    /// or expired. Never fails: a failed fetch yields an empty snapshot and
    /// the error message. The TTL window starts when the fetch completes.
    pub async fn get(&self) -> LoadedOrders {
        self.get_inner(None).await
    }

    /// Like [`get`](Self::get) with a fixed clock: freshness is checked and
    /// a new snapshot is stamped at `now`.
    pub async fn get_at(&self, now: Instant) -> LoadedOrders {
        self.get_inner(Some(now)).await
    }

    async fn get_inner(&self, now: Option<Instant>) -> LoadedOrders {
        let mut slot = self.slot.lock().await;
        let checked_at = now.unwrap_or_else(Instant::now);

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh_at(checked_at, self.ttl) {
                log::debug!(
                    "Cache hit ({} records, age {}s)",
                    cached.records.len(),
                    checked_at.saturating_duration_since(cached.fetched_at).as_secs()
                );
                return cached.loaded();
            }
            log::debug!("Cache expired after {}s, refreshing", self.ttl.as_secs());
        } else {
            log::debug!("Cache empty, fetching from {}", self.source.name());
        }

        let (records, error) = match self.fetch().await {
            Ok(records) => (records, None),
            Err(e) => {
                log::error!("Failed to load service orders from {}: {e}", self.source.name());
                (Vec::new(), Some(e.to_string()))
            }
        };

        let cached = CachedSnapshot {
            records: Arc::new(records),
            error,
            fetched_at: now.unwrap_or_else(Instant::now),
        };
        let loaded = cached.loaded();
        *slot = Some(cached);
        loaded
    }

    /// Drop the cached snapshot so the next `get` fetches again.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }

    async fn fetch(&self) -> Result<Vec<ServiceOrderRecord>> {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || source.fetch()).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ServiceType;
    use crate::error::Error;
    use crate::status::OrderStatus;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
        delay: Duration,
    }

    impl CountingSource {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
                delay: Duration::ZERO,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OrderSource for CountingSource {
        fn name(&self) -> &str {
            "counting"
        }

        fn fetch(&self) -> Result<Vec<ServiceOrderRecord>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as i64;
            std::thread::sleep(self.delay);
            if self.fail {
                return Err(Error::DataSource("connection refused".into()));
            }
            Ok(vec![ServiceOrderRecord {
                order_id: n,
                property_id: 1,
                locality_id: 1,
                generated_at: NaiveDate::from_ymd_opt(2025, 6, 2)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap(),
                closed_at: None,
                service_type: ServiceType::Diagnostic,
                status: OrderStatus::Pending,
                service_description: "DIAGNOSTICO".into(),
                closure_reason: None,
            }])
        }
    }

    #[tokio::test]
    async fn test_hit_within_ttl_reuses_snapshot() {
        let source = CountingSource::new(false);
        let cache = SnapshotCache::new(source.clone());
        let t0 = Instant::now();

        let first = cache.get_at(t0).await;
        let second = cache.get_at(t0 + Duration::from_secs(599)).await;

        assert_eq!(source.calls(), 1);
        assert!(Arc::ptr_eq(&first.records, &second.records));
        assert!(first.error.is_none());
    }

    #[tokio::test]
    async fn test_expiry_triggers_one_refresh() {
        let source = CountingSource::new(false);
        let cache = SnapshotCache::new(source.clone());
        let t0 = Instant::now();

        let first = cache.get_at(t0).await;
        let refreshed = cache.get_at(t0 + Duration::from_secs(600)).await;
        let again = cache.get_at(t0 + Duration::from_secs(601)).await;

        assert_eq!(source.calls(), 2);
        assert!(!Arc::ptr_eq(&first.records, &refreshed.records));
        assert!(Arc::ptr_eq(&refreshed.records, &again.records));
        // The old snapshot is untouched by the refresh.
        assert_eq!(first.records[0].order_id, 0);
        assert_eq!(refreshed.records[0].order_id, 1);
    }

    #[tokio::test]
    async fn test_failure_yields_empty_snapshot_and_diagnostic() {
        let source = CountingSource::new(true);
        let cache = SnapshotCache::new(source.clone());

        let loaded = cache.get().await;
        assert!(loaded.is_empty());
        assert!(loaded.error.as_deref().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_failure_is_served_until_expiry() {
        let source = CountingSource::new(true);
        let cache = SnapshotCache::new(source.clone());
        let t0 = Instant::now();

        cache.get_at(t0).await;
        let again = cache.get_at(t0 + Duration::from_secs(1)).await;
        assert_eq!(source.calls(), 1);
        assert!(again.is_empty());
        assert!(again.error.as_deref().unwrap().contains("connection refused"));

        cache.get_at(t0 + Duration::from_secs(600)).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_retries_after_failure() {
        let source = CountingSource::new(true);
        let cache = SnapshotCache::new(source.clone());
        let t0 = Instant::now();

        cache.get_at(t0).await;
        cache.invalidate().await;
        cache.get_at(t0).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_failed_fetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: true,
            delay: Duration::from_millis(200),
        });
        let cache = Arc::new(SnapshotCache::new(source.clone()));

        let started = Instant::now();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await })
            })
            .collect();

        for handle in handles {
            let loaded = handle.await.unwrap();
            assert!(loaded.is_empty());
            assert!(loaded.error.is_some());
        }

        assert_eq!(source.calls(), 1);
        assert!(started.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_ttl_window_starts_after_slow_fetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
            delay: Duration::from_millis(200),
        });
        let cache = SnapshotCache::with_ttl(source.clone(), Duration::from_millis(150));

        cache.get().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.get().await;

        // The second call lands 50ms after the fetch finished, inside the
        // window, even though the fetch itself took longer than the TTL.
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fetch() {
        let source = CountingSource::new(false);
        let cache = SnapshotCache::new(source.clone());
        let t0 = Instant::now();

        cache.get_at(t0).await;
        cache.invalidate().await;
        cache.get_at(t0).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_fetch() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            fail: false,
            delay: Duration::from_millis(50),
        });
        let cache = Arc::new(SnapshotCache::new(source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await })
            })
            .collect();

        let mut snapshots = Vec::new();
        for handle in handles {
            snapshots.push(handle.await.unwrap());
        }

        assert_eq!(source.calls(), 1);
        for loaded in &snapshots {
            assert!(Arc::ptr_eq(&loaded.records, &snapshots[0].records));
        }
    }
}
