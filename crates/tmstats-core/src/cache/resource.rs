//! The orchestrating cache for one resource (or one options payload).

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt};
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info};

use super::entry::{CacheEntry, CacheKey};
use super::freshness::{is_fresh, Clock};
use super::slot::MemorySlot;
use super::store::PersistentStore;
use crate::utils::age_display;

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Snapshot of both tiers of one cache, taken without mutating either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub key: String,
    /// The memory slot holds an entry that is still fresh.
    pub in_memory: bool,
    /// The persistent store holds a decodable entry that is still fresh.
    pub persistent: bool,
    /// Newest known fetch time; the memory slot wins when both exist.
    pub last_fetched: Option<DateTime<Utc>>,
    pub ttl_secs: i64,
}

impl CacheStatus {
    pub fn is_stale(&self) -> bool {
        !self.in_memory && !self.persistent
    }

    /// Human-readable age of `last_fetched`, or "never".
    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        match self.last_fetched {
            Some(fetched_at) => age_display(fetched_at, now),
            None => "never".to_string(),
        }
    }
}

/// Read-through cache for a single payload: memory slot, then persistent
/// store, then the remote fetcher.
///
/// Concurrent misses on the same instance share one fetch: the first
/// caller fetches while the rest wait and then read its result from the
/// memory slot.
pub struct ResourceCache<T> {
    key: CacheKey,
    ttl: Duration,
    slot: MemorySlot<T>,
    store: PersistentStore,
    clock: Arc<dyn Clock>,
    fetcher: FetchFn<T>,
    fetch_lock: AsyncMutex<()>,
}

impl<T> ResourceCache<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new<F, Fut>(
        key: CacheKey,
        ttl: Duration,
        store: PersistentStore,
        clock: Arc<dyn Clock>,
        fetch: F,
    ) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            key,
            ttl,
            slot: MemorySlot::new(),
            store,
            clock,
            fetcher: Arc::new(move || fetch().boxed()),
            fetch_lock: AsyncMutex::new(()),
        }
    }

    /// Return the freshest known snapshot, fetching only when neither tier
    /// holds a fresh entry. `force_refresh` drops both tiers first and
    /// always fetches.
    ///
    /// Fetch errors are returned as-is; stale data is never served in
    /// their place.
    pub async fn get_cached(&self, force_refresh: bool) -> Result<Arc<T>> {
        if force_refresh {
            self.clear_cache();
        } else if let Some(data) = self.lookup() {
            return Ok(data);
        }

        let _guard = self.fetch_lock.lock().await;

        if !force_refresh {
            // Another caller may have completed a fetch while we waited
            if let Some(data) = self.fresh_in_memory() {
                debug!(key = %self.key, "Served by concurrent fetch");
                return Ok(data);
            }
        }

        self.fetch_and_store().await
    }

    /// Drop both tiers for this key.
    pub fn clear_cache(&self) {
        self.slot.clear();
        self.store.remove(self.key.as_str());
        debug!(key = %self.key, "Cache cleared");
    }

    pub fn cache_status(&self) -> CacheStatus {
        let now = self.clock.now();
        let memory = self.slot.get();
        let persisted = self.store.peek::<T>(self.key.as_str());

        CacheStatus {
            key: self.key.to_string(),
            in_memory: memory
                .as_ref()
                .is_some_and(|entry| is_fresh(entry.fetched_at, self.ttl, now)),
            persistent: persisted
                .as_ref()
                .is_some_and(|entry| is_fresh(entry.fetched_at, self.ttl, now)),
            last_fetched: memory
                .map(|entry| entry.fetched_at)
                .or_else(|| persisted.map(|entry| entry.fetched_at)),
            ttl_secs: self.ttl.num_seconds(),
        }
    }

    fn fresh_in_memory(&self) -> Option<Arc<T>> {
        let entry = self.slot.get()?;
        is_fresh(entry.fetched_at, self.ttl, self.clock.now()).then_some(entry.data)
    }

    fn lookup(&self) -> Option<Arc<T>> {
        if let Some(data) = self.fresh_in_memory() {
            debug!(key = %self.key, "Memory cache hit");
            return Some(data);
        }

        let entry = self.store.read::<T>(self.key.as_str())?;
        if !is_fresh(entry.fetched_at, self.ttl, self.clock.now()) {
            debug!(key = %self.key, fetched_at = %entry.fetched_at, "Persistent entry is stale");
            return None;
        }

        debug!(key = %self.key, "Promoting persistent entry to memory");
        let entry = entry.map(Arc::new);
        let data = Arc::clone(&entry.data);
        self.slot.set(entry);
        Some(data)
    }

    async fn fetch_and_store(&self) -> Result<Arc<T>> {
        let data = match (self.fetcher)().await {
            Ok(data) => Arc::new(data),
            Err(e) => {
                error!(key = %self.key, error = %e, "Remote fetch failed");
                return Err(e.context(format!("Failed to fetch {}", self.key)));
            }
        };

        let entry = CacheEntry::new(data, self.clock.now());
        self.store.write(self.key.as_str(), &entry.borrowed());
        info!(key = %self.key, "Fetched and cached");

        let data = Arc::clone(&entry.data);
        self.slot.set(entry);
        Ok(data)
    }
}
