//! `PrayerTimeService`: the resolver entry point.
//!
//! Order of attempts: cache, then each producer in turn (by default exact
//! override, remote chain, local calculator). Every success is written
//! through both cache tiers.

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, Utc};
use miqat_astronomy::{CalculationParams, CorrectionTable, LocalCalculator};
use miqat_network::TimingsClient;
use miqat_types::{Location, LocationRegistry, MiqatError, PrayerTimeSet};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CacheStore, JsonFileStore, MemoryStore, TieredCache};
use crate::config::ServiceConfig;
use crate::marker::{FileMarker, MemoryMarker, SyncMarkerStore};
use crate::overrides::ExactOverrides;
use crate::producer::PrayerTimeProducer;
use crate::remote::RemoteResolverChain;

/// When a freshly resolved set reaches the durable tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Persist {
    Now,
    /// Staged; the caller flushes once for the whole batch.
    Deferred,
}

/// Process-wide prayer-time context. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct PrayerTimeService {
    pub(crate) inner: Arc<ServiceInner>,
}

#[derive(Debug)]
pub(crate) struct ServiceInner {
    pub(crate) registry: LocationRegistry,
    pub(crate) cache: TieredCache,
    pub(crate) producers: Vec<Arc<dyn PrayerTimeProducer>>,
    pub(crate) marker_store: Arc<dyn SyncMarkerStore>,
    /// Last synced date; the lock serializes the daily compare-and-set.
    pub(crate) sync_marker: Mutex<Option<NaiveDate>>,
    pub(crate) utc_offset_hours: f64,
}

impl PrayerTimeService {
    pub fn builder() -> PrayerTimeServiceBuilder {
        PrayerTimeServiceBuilder::default()
    }

    /// Wires registry, producers and stores from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, MiqatError> {
        config.validate()?;

        let params = CalculationParams::new()
            .asr_shadow(config.asr_shadow)
            .utc_offset_hours(config.utc_offset_hours);

        let mut producers: Vec<Arc<dyn PrayerTimeProducer>> = vec![Arc::new(ExactOverrides::reference())];
        if config.remote_enabled {
            let client = TimingsClient::new(
                Duration::from_secs(config.request_timeout_secs),
                config.timezone.clone(),
                config.asr_shadow,
            )?;
            producers.push(Arc::new(RemoteResolverChain::new(
                client,
                config.primary.clone(),
                config.fallback.clone(),
            )));
        }
        producers.push(Arc::new(LocalCalculator::new(params, CorrectionTable::reference())));

        let mut builder = Self::builder()
            .registry(config.registry()?)
            .producers(producers)
            .utc_offset_hours(config.utc_offset_hours);

        if let Some(path) = &config.cache_path {
            builder = builder.durable_store(Arc::new(JsonFileStore::open(path)?));
        }
        if let Some(path) = &config.marker_path {
            builder = builder.marker_store(Arc::new(FileMarker::new(path)));
        }
        builder.build()
    }

    pub fn registry(&self) -> &LocationRegistry {
        &self.inner.registry
    }

    pub fn cache(&self) -> &TieredCache {
        &self.inner.cache
    }

    /// Returns prayer times for a registered location on `date`.
    ///
    /// # Errors
    /// - `InvalidLocation` before any other work if the name is unknown
    /// - `UnresolvablePrayerTimes` if every producer fails
    pub async fn get_prayer_times(&self, name: &str, date: NaiveDate) -> Result<PrayerTimeSet, MiqatError> {
        self.lookup_or_resolve(name, date, Persist::Now).await
    }

    pub(crate) async fn lookup_or_resolve(
        &self,
        name: &str,
        date: NaiveDate,
        persist: Persist,
    ) -> Result<PrayerTimeSet, MiqatError> {
        let location = self.inner.registry.get(name)?;
        let key = CacheKey::new(name, date);

        if let Some(hit) = self.inner.cache.get(&key) {
            return Ok(hit);
        }

        let set = self.resolve(location, date).await?;
        let written = match persist {
            Persist::Now => {
                let (key, value) = (key.clone(), set.clone());
                self.with_cache_blocking(move |cache| cache.put(key, value)).await
            }
            Persist::Deferred => self.inner.cache.stage(key.clone(), set.clone()),
        };
        if let Err(e) = written {
            warn!(%key, error = %e, "prayer times resolved but not cached");
        }
        Ok(set)
    }

    /// Runs a cache operation that may touch the filesystem on the blocking pool.
    pub(crate) async fn with_cache_blocking<T, F>(&self, op: F) -> Result<T, MiqatError>
    where
        F: FnOnce(&TieredCache) -> Result<T, MiqatError> + Send + 'static,
        T: Send + 'static,
    {
        let cache = self.inner.cache.clone();
        tokio::task::spawn_blocking(move || op(&cache))
            .await
            .map_err(|e| MiqatError::storage(format!("cache task failed: {}", e)))?
    }

    /// Request-path entry point: syncs on date rollover, then resolves today.
    pub async fn times_for_today(&self, name: &str) -> Result<PrayerTimeSet, MiqatError> {
        self.inner.registry.get(name)?;
        let today = self.today();
        self.check_and_sync(today).await;
        self.get_prayer_times(name, today).await
    }

    /// Current date on the configured region clock.
    pub fn today(&self) -> NaiveDate {
        let seconds = (self.inner.utc_offset_hours * 3600.0).round() as i32;
        match FixedOffset::east_opt(seconds) {
            Some(offset) => Utc::now().with_timezone(&offset).date_naive(),
            None => Utc::now().date_naive(),
        }
    }

    /// Runs the producers in order and returns the first result.
    async fn resolve(&self, location: &Location, date: NaiveDate) -> Result<PrayerTimeSet, MiqatError> {
        for producer in &self.inner.producers {
            match producer.resolve(location, date).await {
                Ok(Some(set)) => {
                    if !set.is_ordered() {
                        warn!(location = %location.name, %date, producer = producer.name(), %set, "prayer times out of order");
                    }
                    info!(location = %location.name, %date, source = %set.source, "resolved prayer times");
                    return Ok(set);
                }
                Ok(None) => {
                    debug!(location = %location.name, %date, producer = producer.name(), "producer not applicable");
                }
                Err(e) => {
                    warn!(location = %location.name, %date, producer = producer.name(), error = %e, "producer failed");
                }
            }
        }

        Err(MiqatError::UnresolvablePrayerTimes {
            location: location.name.clone(),
            date,
        })
    }
}

/// Builder for [`PrayerTimeService`].
///
/// Defaults: reference registry, in-memory tiers and marker, and an offline
/// producer list of exact overrides followed by the local calculator.
#[derive(Debug, Default)]
pub struct PrayerTimeServiceBuilder {
    registry: Option<LocationRegistry>,
    producers: Option<Vec<Arc<dyn PrayerTimeProducer>>>,
    transient: Option<Arc<dyn CacheStore>>,
    durable: Option<Arc<dyn CacheStore>>,
    marker_store: Option<Arc<dyn SyncMarkerStore>>,
    utc_offset_hours: Option<f64>,
}

impl PrayerTimeServiceBuilder {
    pub fn registry(mut self, registry: LocationRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Replaces the ordered producer list.
    pub fn producers(mut self, producers: Vec<Arc<dyn PrayerTimeProducer>>) -> Self {
        self.producers = Some(producers);
        self
    }

    pub fn transient_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.transient = Some(store);
        self
    }

    pub fn durable_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.durable = Some(store);
        self
    }

    pub fn marker_store(mut self, store: Arc<dyn SyncMarkerStore>) -> Self {
        self.marker_store = Some(store);
        self
    }

    pub fn utc_offset_hours(mut self, offset: f64) -> Self {
        self.utc_offset_hours = Some(offset);
        self
    }

    /// Builds the service, loading the persisted sync marker.
    pub fn build(self) -> Result<PrayerTimeService, MiqatError> {
        let producers = self.producers.unwrap_or_else(|| {
            vec![
                Arc::new(ExactOverrides::reference()) as Arc<dyn PrayerTimeProducer>,
                Arc::new(LocalCalculator::reference()),
            ]
        });
        if producers.is_empty() {
            return Err(MiqatError::invalid_config("at least one producer is required"));
        }

        let marker_store = self
            .marker_store
            .unwrap_or_else(|| Arc::new(MemoryMarker::new()));
        let last_synced = marker_store.load()?;

        let cache = TieredCache::new(
            self.transient.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            self.durable.unwrap_or_else(|| Arc::new(MemoryStore::new())),
        );

        Ok(PrayerTimeService {
            inner: Arc::new(ServiceInner {
                registry: self.registry.unwrap_or_else(LocationRegistry::reference),
                cache,
                producers,
                marker_store,
                sync_marker: Mutex::new(last_synced),
                utc_offset_hours: self.utc_offset_hours.unwrap_or(5.0),
            }),
        })
    }
}
