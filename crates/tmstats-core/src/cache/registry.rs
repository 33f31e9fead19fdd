//! The set of resource caches used by the dashboard, built once and
//! passed around explicitly.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use super::entry::{CacheKey, TtlPolicy, SCHEMA_VERSION};
use super::freshness::{Clock, SystemClock};
use super::resource::{CacheStatus, ResourceCache};
use super::store::{FileStore, KeyValueStore, MemoryStore, PersistentStore};
use crate::api::{ApiClient, Resource};
use crate::config::Config;
use crate::models::{
    AwardStats, CardMode, CardStats, CorporationStats, FilterOptions, MilestoneStats, PreludeStats,
};

/// One `ResourceCache` per collection and per options payload.
///
/// Instances share the persistent store, the API client and the clock
/// but no cached state: each owns its memory slot and its key.
pub struct StatsCaches {
    corporations: ResourceCache<Vec<CorporationStats>>,
    cards_played: ResourceCache<Vec<CardStats>>,
    cards_kept: ResourceCache<Vec<CardStats>>,
    cards_drawn: ResourceCache<Vec<CardStats>>,
    cards_bought: ResourceCache<Vec<CardStats>>,
    preludes: ResourceCache<Vec<PreludeStats>>,
    awards: ResourceCache<Vec<AwardStats>>,
    milestones: ResourceCache<Vec<MilestoneStats>>,
    corporation_options: ResourceCache<FilterOptions>,
    card_options: ResourceCache<FilterOptions>,
    prelude_options: ResourceCache<FilterOptions>,
    award_options: ResourceCache<FilterOptions>,
    milestone_options: ResourceCache<FilterOptions>,
    clock: Arc<dyn Clock>,
}

impl StatsCaches {
    pub fn new(
        client: ApiClient,
        store: PersistentStore,
        ttl: TtlPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cards = |mode: CardMode| {
            let client = client.clone();
            ResourceCache::new(
                CacheKey::new(Resource::Card.domain(), mode.as_str(), SCHEMA_VERSION),
                ttl.collection,
                store.clone(),
                clock.clone(),
                move || {
                    let client = client.clone();
                    async move { client.fetch_cards(mode).await }
                },
            )
        };
        let options = |resource: Resource| {
            let client = client.clone();
            ResourceCache::new(
                CacheKey::options(resource.domain()),
                ttl.options,
                store.clone(),
                clock.clone(),
                move || {
                    let client = client.clone();
                    async move { client.fetch_options(resource).await }
                },
            )
        };

        Self {
            corporations: {
                let client = client.clone();
                ResourceCache::new(
                    CacheKey::collection(Resource::Corporation.domain()),
                    ttl.collection,
                    store.clone(),
                    clock.clone(),
                    move || {
                        let client = client.clone();
                        async move { client.fetch_corporations().await }
                    },
                )
            },
            cards_played: cards(CardMode::Played),
            cards_kept: cards(CardMode::Kept),
            cards_drawn: cards(CardMode::Drawn),
            cards_bought: cards(CardMode::Bought),
            preludes: {
                let client = client.clone();
                ResourceCache::new(
                    CacheKey::collection(Resource::Prelude.domain()),
                    ttl.collection,
                    store.clone(),
                    clock.clone(),
                    move || {
                        let client = client.clone();
                        async move { client.fetch_preludes().await }
                    },
                )
            },
            awards: {
                let client = client.clone();
                ResourceCache::new(
                    CacheKey::collection(Resource::Award.domain()),
                    ttl.collection,
                    store.clone(),
                    clock.clone(),
                    move || {
                        let client = client.clone();
                        async move { client.fetch_awards().await }
                    },
                )
            },
            milestones: {
                let client = client.clone();
                ResourceCache::new(
                    CacheKey::collection(Resource::Milestone.domain()),
                    ttl.collection,
                    store.clone(),
                    clock.clone(),
                    move || {
                        let client = client.clone();
                        async move { client.fetch_milestones().await }
                    },
                )
            },
            corporation_options: options(Resource::Corporation),
            card_options: options(Resource::Card),
            prelude_options: options(Resource::Prelude),
            award_options: options(Resource::Award),
            milestone_options: options(Resource::Milestone),
            clock,
        }
    }

    /// Build the registry from configuration, using the system clock.
    ///
    /// If the cache directory cannot be created, entries are kept in an
    /// in-memory store for the life of the process instead.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = ApiClient::new(config.api_base_url.as_str())?;
        if let Some(ref token) = config.api_token {
            client = client.with_token(token.clone());
        }

        let backend: Arc<dyn KeyValueStore> =
            match config.cache_dir().and_then(|dir| Ok(FileStore::new(dir)?)) {
                Ok(files) => {
                    info!(dir = %files.dir().display(), "Using file-backed cache");
                    Arc::new(files)
                }
                Err(e) => {
                    warn!(error = %e, "Cache directory unavailable, caching in memory only");
                    Arc::new(MemoryStore::new())
                }
            };
        let store = PersistentStore::new(backend).with_budget(config.storage_budget_bytes);

        Ok(Self::new(
            client,
            store,
            config.ttl_policy(),
            Arc::new(SystemClock),
        ))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ===== Collections =====

    pub async fn corporations(&self, force_refresh: bool) -> Result<Arc<Vec<CorporationStats>>> {
        self.corporations.get_cached(force_refresh).await
    }

    pub async fn cards(&self, mode: CardMode, force_refresh: bool) -> Result<Arc<Vec<CardStats>>> {
        self.card_cache(mode).get_cached(force_refresh).await
    }

    pub async fn preludes(&self, force_refresh: bool) -> Result<Arc<Vec<PreludeStats>>> {
        self.preludes.get_cached(force_refresh).await
    }

    pub async fn awards(&self, force_refresh: bool) -> Result<Arc<Vec<AwardStats>>> {
        self.awards.get_cached(force_refresh).await
    }

    pub async fn milestones(&self, force_refresh: bool) -> Result<Arc<Vec<MilestoneStats>>> {
        self.milestones.get_cached(force_refresh).await
    }

    // ===== Filter options =====

    pub async fn options(&self, resource: Resource, force_refresh: bool) -> Result<Arc<FilterOptions>> {
        self.options_cache(resource).get_cached(force_refresh).await
    }

    fn card_cache(&self, mode: CardMode) -> &ResourceCache<Vec<CardStats>> {
        match mode {
            CardMode::Played => &self.cards_played,
            CardMode::Kept => &self.cards_kept,
            CardMode::Drawn => &self.cards_drawn,
            CardMode::Bought => &self.cards_bought,
        }
    }

    fn options_cache(&self, resource: Resource) -> &ResourceCache<FilterOptions> {
        match resource {
            Resource::Corporation => &self.corporation_options,
            Resource::Card => &self.card_options,
            Resource::Prelude => &self.prelude_options,
            Resource::Award => &self.award_options,
            Resource::Milestone => &self.milestone_options,
        }
    }

    // ===== Invalidation =====

    /// Drop the collection(s) and the options payload of one resource.
    pub fn clear(&self, resource: Resource) {
        match resource {
            Resource::Corporation => self.corporations.clear_cache(),
            Resource::Card => CardMode::ALL
                .iter()
                .for_each(|&mode| self.card_cache(mode).clear_cache()),
            Resource::Prelude => self.preludes.clear_cache(),
            Resource::Award => self.awards.clear_cache(),
            Resource::Milestone => self.milestones.clear_cache(),
        }
        self.options_cache(resource).clear_cache();
    }

    pub fn clear_all(&self) {
        for resource in Resource::ALL {
            self.clear(resource);
        }
    }

    // ===== Diagnostics =====

    /// Status of one resource's collection caches (all card modes for cards).
    pub fn collection_statuses(&self, resource: Resource) -> Vec<CacheStatus> {
        match resource {
            Resource::Corporation => vec![self.corporations.cache_status()],
            Resource::Card => CardMode::ALL
                .iter()
                .map(|&mode| self.card_cache(mode).cache_status())
                .collect(),
            Resource::Prelude => vec![self.preludes.cache_status()],
            Resource::Award => vec![self.awards.cache_status()],
            Resource::Milestone => vec![self.milestones.cache_status()],
        }
    }

    pub fn options_status(&self, resource: Resource) -> CacheStatus {
        self.options_cache(resource).cache_status()
    }

    /// Status of every cache, collections first, in a stable order.
    pub fn statuses(&self) -> Vec<CacheStatus> {
        let mut statuses: Vec<CacheStatus> = Resource::ALL
            .iter()
            .flat_map(|&resource| self.collection_statuses(resource))
            .collect();
        statuses.extend(
            Resource::ALL
                .iter()
                .map(|&resource| self.options_status(resource)),
        );
        statuses
    }

    /// Whether any collection lacks a fresh entry in both tiers.
    pub fn any_stale(&self) -> bool {
        Resource::ALL
            .iter()
            .flat_map(|&resource| self.collection_statuses(resource))
            .any(|status| status.is_stale())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    /// Not a valid URL: every fetch fails while building the request,
    /// before any socket is opened.
    const OFFLINE: &str = "tmstats offline";

    fn registry(backend: Arc<MemoryStore>, clock: Arc<ManualClock>) -> StatsCaches {
        StatsCaches::new(
            ApiClient::new(OFFLINE).unwrap(),
            PersistentStore::new(backend),
            TtlPolicy::default(),
            clock,
        )
    }

    #[test]
    fn test_keys_are_distinct_per_resource_and_variant() {
        let caches = registry(
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_millis(0)),
        );
        let keys: Vec<String> = caches.statuses().into_iter().map(|s| s.key).collect();
        assert_eq!(
            keys,
            vec![
                "corp:all:v1",
                "card:played:v1",
                "card:kept:v1",
                "card:drawn:v1",
                "card:bought:v1",
                "prelude:all:v1",
                "award:all:v1",
                "milestone:all:v1",
                "corp:options:v1",
                "card:options:v1",
                "prelude:options:v1",
                "award:options:v1",
                "milestone:options:v1",
            ]
        );
    }

    #[tokio::test]
    async fn test_serves_persisted_entries_without_network() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set_item(
                "corp:all:v1",
                r#"{"data":[{"name":"Tharsis Republic","games":10,"wins":4}],"fetchedAt":0}"#,
            )
            .unwrap();
        backend
            .set_item(
                "card:kept:v1",
                r#"{"data":[{"name":"Birds","games":3}],"fetchedAt":0}"#,
            )
            .unwrap();
        backend
            .set_item(
                "prelude:options:v1",
                r#"{"data":{"maps":["Hellas"]},"fetchedAt":0}"#,
            )
            .unwrap();
        let clock = Arc::new(ManualClock::at_millis(60_000));
        let caches = registry(backend, clock);

        let corps = caches.corporations(false).await.unwrap();
        assert_eq!(corps[0].name, "Tharsis Republic");
        assert_eq!(corps[0].wins, 4);

        let cards = caches.cards(CardMode::Kept, false).await.unwrap();
        assert_eq!(cards[0].name, "Birds");

        let options = caches.options(Resource::Prelude, false).await.unwrap();
        assert_eq!(options.maps, vec!["Hellas".to_string()]);

        // Played cards were never cached and the API is offline
        assert!(caches.cards(CardMode::Played, false).await.is_err());
        assert!(caches.any_stale());
    }

    #[tokio::test]
    async fn test_options_use_longer_ttl() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set_item("award:all:v1", r#"{"data":[],"fetchedAt":0}"#)
            .unwrap();
        backend
            .set_item("award:options:v1", r#"{"data":{},"fetchedAt":0}"#)
            .unwrap();
        // 20 minutes later: collection stale, options still fresh
        let caches = registry(backend, Arc::new(ManualClock::at_millis(20 * 60_000)));

        assert!(caches.options(Resource::Award, false).await.is_ok());
        assert!(caches.awards(false).await.is_err());
        assert!(caches.options_status(Resource::Award).in_memory);
        assert!(caches.collection_statuses(Resource::Award)[0].is_stale());
    }

    #[tokio::test]
    async fn test_clear_removes_collection_and_options() {
        let backend = Arc::new(MemoryStore::new());
        for key in ["card:played:v1", "card:bought:v1", "card:options:v1", "corp:all:v1"] {
            let value = if key.contains("options") {
                r#"{"data":{},"fetchedAt":0}"#
            } else {
                r#"{"data":[],"fetchedAt":0}"#
            };
            backend.set_item(key, value).unwrap();
        }
        let caches = registry(backend.clone(), Arc::new(ManualClock::at_millis(0)));
        caches.cards(CardMode::Played, false).await.unwrap();

        caches.clear(Resource::Card);
        assert_eq!(backend.keys().unwrap(), vec!["corp:all:v1".to_string()]);
        assert!(caches.cards(CardMode::Played, false).await.is_err());

        caches.clear_all();
        assert!(backend.keys().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_force_refresh_propagates_fetch_error() {
        let backend = Arc::new(MemoryStore::new());
        backend
            .set_item("milestone:all:v1", r#"{"data":[],"fetchedAt":0}"#)
            .unwrap();
        let caches = registry(backend.clone(), Arc::new(ManualClock::at_millis(0)));

        assert!(caches.milestones(false).await.is_ok());
        assert!(caches.milestones(true).await.is_err());
        // The forced refresh invalidated both tiers before failing
        assert_eq!(backend.get_item("milestone:all:v1").unwrap(), None);
        assert!(caches.collection_statuses(Resource::Milestone)[0].is_stale());
    }

    #[test]
    fn test_from_config_falls_back_to_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let config = Config {
            cache_dir: Some(blocker.join("cache")),
            ..Config::default()
        };
        let caches = StatsCaches::from_config(&config).unwrap();
        assert!(caches.statuses().iter().all(|s| s.is_stale()));
    }
}
