//! In-memory snapshot cache
//!
//! Holds at most one snapshot per key. Expiry is checked lazily on read and
//! there is no background refresh. Concurrent misses on the same key each run
//! their computation; the last one to finish overwrites the snapshot.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Default time-to-live of a snapshot
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Snapshot {
    data: Arc<dyn Any + Send + Sync>,
    captured_at: Instant,
}

/// Time-bounded memoization keyed by resource name
pub struct SnapshotCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, Snapshot>>,
}

impl std::fmt::Debug for SnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh value stored under `key`, evicting it when it has expired
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.get_fresh(key, self.ttl)
    }

    /// Store `value` under `key`, replacing any previous snapshot
    pub fn set<T>(&self, key: &str, value: T)
    where
        T: Send + Sync + 'static,
    {
        let snapshot = Snapshot {
            data: Arc::new(value),
            captured_at: self.clock.now(),
        };
        self.lock().insert(key.to_string(), snapshot);
    }

    /// Drop every snapshot
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Serve `key` from the cache, or run `compute` and store its result
    ///
    /// A hit never calls `compute`. A miss calls it exactly once; errors are
    /// returned as-is and leave the cache untouched.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get_fresh::<T>(key, ttl) {
            log::debug!("cache hit: {key}");
            return Ok(value);
        }

        log::debug!("cache miss: {key}");
        let value = compute().await?;
        self.set(key, value.clone());
        Ok(value)
    }

    fn get_fresh<T>(&self, key: &str, ttl: Duration) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let now = self.clock.now();
        let mut entries = self.lock();

        let captured_at = entries.get(key)?.captured_at;
        if now.saturating_duration_since(captured_at) > ttl {
            entries.remove(key);
            return None;
        }

        entries
            .get(key)
            .and_then(|snapshot| snapshot.data.downcast_ref::<T>())
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Snapshot>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clock that only moves when told to
#[cfg(test)]
#[derive(Debug)]
pub struct ManualClock(Mutex<Instant>);

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(Instant::now()))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.0.lock().unwrap()
    }
}
