//! In-memory query cache
//!
//! Results are stored per key, postcard-encoded, together with the instant
//! their fetch started and finished. A [`QueryPolicy`] decides how long an
//! entry counts as fresh, how many times a failed fetch is retried and how
//! often the dashboard refreshes the query in the background.
//!
//! - fresh hit: cached value, no fetch
//! - stale hit: cached value, plus one background refresh per key
//! - miss: fetch (with retries), store, return; concurrent misses on one
//!   key wait for the first fetch instead of starting their own
//!
//! A write never replaces an entry whose fetch started later.

use crate::config::CacheConfig;
use crate::Result;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

const HOUR: Duration = Duration::from_secs(60 * 60);

/// Freshness and retry rules for one kind of query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicy {
    /// Age after which a cached value is served but refreshed
    pub stale_after: Duration,
    /// Background refresh period, if the query has one
    pub refetch_interval: Option<Duration>,
    /// Extra attempts after a failed fetch
    pub retries: u32,
}

impl QueryPolicy {
    /// Always stale, refreshed every 5 minutes
    pub const WEATHER: Self = Self {
        stale_after: Duration::ZERO,
        refetch_interval: Some(Duration::from_secs(5 * 60)),
        retries: 2,
    };

    pub const EVENTS: Self = Self {
        stale_after: HOUR,
        refetch_interval: Some(HOUR),
        retries: 2,
    };

    pub const ADVISORIES: Self = Self {
        stale_after: Duration::from_secs(30 * 60),
        refetch_interval: Some(HOUR),
        retries: 0,
    };

    /// Places do not move; no periodic refresh
    pub const PLACES: Self = Self {
        stale_after: HOUR,
        refetch_interval: None,
        retries: 2,
    };

    #[must_use]
    pub fn is_fresh(&self, age: Duration) -> bool {
        age < self.stale_after
    }
}

/// One policy per dashboard query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryPolicies {
    pub weather: QueryPolicy,
    pub events: QueryPolicy,
    pub advisories: QueryPolicy,
    pub places: QueryPolicy,
}

impl Default for QueryPolicies {
    fn default() -> Self {
        Self {
            weather: QueryPolicy::WEATHER,
            events: QueryPolicy::EVENTS,
            advisories: QueryPolicy::ADVISORIES,
            places: QueryPolicy::PLACES,
        }
    }
}

/// Cache keys, derived from destination identity
pub mod keys {
    #[must_use]
    pub fn weather(name: &str) -> String {
        format!("weather:{name}")
    }

    #[must_use]
    pub fn events(name: &str) -> String {
        format!("events:{name}")
    }

    pub const ADVISORIES: &str = "advisories";

    /// Coordinates rounded to four decimals (about 11 m)
    #[must_use]
    pub fn places(latitude: f64, longitude: f64) -> String {
        format!("places:{latitude:.4}:{longitude:.4}")
    }
}

#[derive(Debug)]
struct StoredEntry {
    bytes: Vec<u8>,
    started_at: Instant,
    fetched_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    entries: RwLock<HashMap<String, StoredEntry>>,
    in_flight: Mutex<HashSet<String>>,
    loading: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    retry_base_delay: Duration,
}

/// Shared handle; clones point at the same entries.
#[derive(Debug, Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl QueryCache {
    #[must_use]
    pub fn new(retry_base_delay: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(HashMap::new()),
                in_flight: Mutex::new(HashSet::new()),
                loading: Mutex::new(HashMap::new()),
                retry_base_delay,
            }),
        }
    }

    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.retry_base_delay())
    }

    /// Cached value for `key` when present, else the result of `fetch`.
    ///
    /// Only successful fetches are stored. A stale value is returned as is
    /// while a refresh runs on a spawned task.
    #[instrument(skip(self, policy, fetch))]
    pub async fn query<T, F, Fut>(&self, key: &str, policy: &QueryPolicy, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if let Some((value, age)) = self.lookup::<T>(key).await {
            if policy.is_fresh(age) {
                debug!("Fresh hit ({:.1}s old)", age.as_secs_f64());
            } else {
                debug!("Stale hit ({:.1}s old), refreshing in background", age.as_secs_f64());
                self.spawn_refresh(key, *policy, fetch);
            }
            return Ok(value);
        }

        let gate = self.loading_gate(key);
        let _loading = gate.lock().await;

        // Another caller may have filled the entry while this one waited.
        if let Some((value, _)) = self.lookup::<T>(key).await {
            debug!("Filled by a concurrent fetch");
            return Ok(value);
        }

        debug!("Miss");
        self.refresh(key, policy, &fetch).await
    }

    /// Fetch now, regardless of what is cached, and store the result.
    pub async fn refresh<T, F, Fut>(&self, key: &str, policy: &QueryPolicy, fetch: &F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started_at = Instant::now();
        let value = self.fetch_with_retries(key, policy, fetch).await?;
        let bytes = postcard::to_stdvec(&value)?;
        self.store(key, bytes, started_at).await;
        Ok(value)
    }

    /// Cached value regardless of age
    pub async fn peek<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).await.map(|(value, _)| value)
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.inner.entries.read().await.contains_key(key)
    }

    pub async fn invalidate(&self, key: &str) {
        if self.inner.entries.write().await.remove(key).is_some() {
            debug!("Invalidated '{}'", key);
        }
    }

    pub async fn clear(&self) {
        self.inner.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn lookup<T: DeserializeOwned>(&self, key: &str) -> Option<(T, Duration)> {
        let entries = self.inner.entries.read().await;
        let entry = entries.get(key)?;

        match postcard::from_bytes(&entry.bytes) {
            Ok(value) => Some((value, entry.fetched_at.elapsed())),
            Err(e) => {
                warn!("Ignoring undecodable entry '{}': {}", key, e);
                None
            }
        }
    }

    /// Insert unless the current entry comes from a fetch that started later.
    async fn store(&self, key: &str, bytes: Vec<u8>, started_at: Instant) {
        let mut entries = self.inner.entries.write().await;

        if let Some(existing) = entries.get(key)
            && existing.started_at > started_at
        {
            debug!("Keeping newer entry for '{}'", key);
            return;
        }

        entries.insert(
            key.to_string(),
            StoredEntry {
                bytes,
                started_at,
                fetched_at: Instant::now(),
            },
        );
    }

    async fn fetch_with_retries<T, F, Fut>(
        &self,
        key: &str,
        policy: &QueryPolicy,
        fetch: &F,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < policy.retries => {
                    let delay = self.inner.retry_base_delay * 2u32.pow(attempt);
                    attempt += 1;
                    warn!(
                        "Fetch for '{}' failed (attempt {}/{}), retrying in {:?}: {}",
                        key,
                        attempt,
                        policy.retries + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn spawn_refresh<T, F, Fut>(&self, key: &str, policy: QueryPolicy, fetch: F)
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        if !self.begin_refresh(key) {
            debug!("Refresh for '{}' already running", key);
            return;
        }

        let cache = self.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(e) = cache.refresh(&key, &policy, &fetch).await {
                warn!("Background refresh of '{}' failed: {}", key, e);
            }
            cache.end_refresh(&key);
        });
    }

    fn loading_gate(&self, key: &str) -> Arc<AsyncMutex<()>> {
        match self.inner.loading.lock() {
            Ok(mut loading) => loading.entry(key.to_string()).or_default().clone(),
            Err(_) => Arc::new(AsyncMutex::new(())),
        }
    }

    fn begin_refresh(&self, key: &str) -> bool {
        match self.inner.in_flight.lock() {
            Ok(mut in_flight) => in_flight.insert(key.to_string()),
            Err(_) => false,
        }
    }

    fn end_refresh(&self, key: &str) {
        if let Ok(mut in_flight) = self.inner.in_flight.lock() {
            in_flight.remove(key);
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TravelError;
    use futures::FutureExt;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const MINUTE: Duration = Duration::from_secs(60);

    fn counting_fetch(
        counter: Arc<AtomicUsize>,
        delay: Duration,
    ) -> impl Fn() -> BoxFuture<'static, Result<usize>> + Send + Sync + 'static {
        move || {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(delay).await;
                Ok(counter.fetch_add(1, Ordering::SeqCst) + 1)
            }
            .boxed()
        }
    }

    const LONG: QueryPolicy = QueryPolicy {
        stale_after: HOUR,
        refetch_interval: None,
        retries: 0,
    };

    #[test]
    fn test_policies() {
        assert!(!QueryPolicy::WEATHER.is_fresh(Duration::ZERO));
        assert_eq!(QueryPolicy::WEATHER.refetch_interval, Some(5 * MINUTE));
        assert_eq!(QueryPolicy::WEATHER.retries, 2);
        assert!(QueryPolicy::EVENTS.is_fresh(59 * MINUTE));
        assert!(!QueryPolicy::ADVISORIES.is_fresh(30 * MINUTE));
        assert_eq!(QueryPolicy::PLACES.refetch_interval, None);
        assert_eq!(QueryPolicy::PLACES.retries, 2);
    }

    #[test]
    fn test_keys() {
        assert_eq!(keys::weather("Cancun"), "weather:Cancun");
        assert_eq!(keys::events("Tulum"), "events:Tulum");
        assert_eq!(keys::places(21.16191, -86.85152), "places:21.1619:-86.8515");
    }

    #[tokio::test]
    async fn test_fresh_hit_does_not_fetch() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let counter = Arc::new(AtomicUsize::new(0));

        let fetch = || counting_fetch(counter.clone(), Duration::ZERO);
        let first = cache.query("k", &LONG, fetch()).await.unwrap();
        let second = cache.query("k", &LONG, fetch()).await.unwrap();

        assert_eq!((first, second), (1, 1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(cache.contains("k").await);
    }

    #[tokio::test]
    async fn test_stale_hit_serves_cached_and_refreshes() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let counter = Arc::new(AtomicUsize::new(0));
        let policy = QueryPolicy::WEATHER;

        let fetch = || counting_fetch(counter.clone(), Duration::ZERO);
        let first = cache.query("w", &policy, fetch()).await.unwrap();
        assert_eq!(first, 1);

        let second = cache.query("w", &policy, fetch()).await.unwrap();
        assert_eq!(second, 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(cache.peek::<usize>("w").await, Some(2));
    }

    #[tokio::test]
    async fn test_one_background_refresh_per_key() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let counter = Arc::new(AtomicUsize::new(0));
        let policy = QueryPolicy::WEATHER;

        cache.query("w", &policy, counting_fetch(counter.clone(), Duration::ZERO)).await.unwrap();
        for _ in 0..3 {
            cache
                .query("w", &policy, counting_fetch(counter.clone(), Duration::from_millis(30)))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let counter = Arc::new(AtomicUsize::new(0));
        let fetch = || counting_fetch(counter.clone(), Duration::from_millis(30));

        let (first, second) = tokio::join!(
            cache.query("events:Cancun", &QueryPolicy::EVENTS, fetch()),
            cache.query("events:Cancun", &QueryPolicy::EVENTS, fetch())
        );

        assert_eq!((first.unwrap(), second.unwrap()), (1, 1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_miss_retries_after_failed_fetch() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let attempts = Arc::new(AtomicUsize::new(0));
        let fetch = {
            let attempts = attempts.clone();
            move || {
                let attempts = attempts.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(TravelError::transport("connection reset"))
                    } else {
                        Ok("Tulum".to_string())
                    }
                }
            }
        };

        let (first, second) = tokio::join!(
            cache.query("k", &LONG, fetch.clone()),
            cache.query("k", &LONG, fetch)
        );

        assert!(first.is_err());
        assert_eq!(second.unwrap(), "Tulum");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let attempts = Arc::new(AtomicUsize::new(0));
        let policy = QueryPolicy { retries: 2, ..LONG };

        let fetch = {
            let attempts = attempts.clone();
            move || {
                let attempts = attempts.clone();
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TravelError::transport("connection reset"))
                    } else {
                        Ok("Jazz en la Playa".to_string())
                    }
                }
            }
        };

        let value = cache.query("events:Cancun", &policy, fetch).await.unwrap();
        assert_eq!(value, "Jazz en la Playa");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_are_not_stored() {
        let cache = QueryCache::new(Duration::from_millis(1));
        let attempts = Arc::new(AtomicUsize::new(0));

        let fetch = {
            let attempts = attempts.clone();
            move || {
                let attempts = attempts.clone();
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<String, _>(TravelError::status("ticketmaster", 503, "unavailable"))
                }
            }
        };

        let result = cache.query("events:Tulum", &QueryPolicy { retries: 1, ..LONG }, fetch).await;
        assert!(matches!(result, Err(TravelError::Status { status: 503, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(!cache.contains("events:Tulum").await);
    }

    #[tokio::test]
    async fn test_older_request_never_overwrites_newer() {
        let cache = QueryCache::new(Duration::from_millis(1));

        let slow = || async {
            tokio::time::sleep(Duration::from_millis(60)).await;
            Ok("old".to_string())
        };
        let fast = || async { Ok("new".to_string()) };

        let (old, new) = tokio::join!(cache.refresh("k", &LONG, &slow), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.refresh("k", &LONG, &fast).await
        });

        assert_eq!(old.unwrap(), "old");
        assert_eq!(new.unwrap(), "new");
        assert_eq!(cache.peek::<String>("k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = QueryCache::default();
        let counter = Arc::new(AtomicUsize::new(0));

        cache.query("a", &LONG, counting_fetch(counter.clone(), Duration::ZERO)).await.unwrap();
        cache.query("b", &LONG, counting_fetch(counter.clone(), Duration::ZERO)).await.unwrap();
        assert_eq!(cache.len().await, 2);

        cache.invalidate("a").await;
        assert!(!cache.contains("a").await);
        let fetch = counting_fetch(counter.clone(), Duration::ZERO);
        let refetched = cache.query("a", &LONG, fetch).await.unwrap();
        assert_eq!(refetched, 3);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
