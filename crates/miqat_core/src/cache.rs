//! Two-tier prayer-time cache.
//!
//! Both tiers sit behind [`CacheStore`] so the longer-lived tier can be
//! swapped for a persistent backend. There is no per-entry expiry; the daily
//! sync clears everything.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use dashmap::DashMap;
use miqat_types::{MiqatError, PrayerTimeSet};
use tracing::{debug, warn};

/// Composite key `(location name, date)`, rendered `<location>-<ISO date>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub location: String,
    pub date: NaiveDate,
}

impl CacheKey {
    pub fn new(location: impl Into<String>, date: NaiveDate) -> Self {
        Self { location: location.into(), date }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.location, self.date.format("%Y-%m-%d"))
    }
}

impl FromStr for CacheKey {
    type Err = MiqatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || MiqatError::invalid_config(format!("Invalid cache key {:?}", s));
        // "<name>-YYYY-MM-DD": the date is always the last ten ASCII bytes.
        if s.len() < 12 || !s.is_char_boundary(s.len() - 11) || !s.is_char_boundary(s.len() - 10) {
            return Err(bad());
        }
        let (head, date) = s.split_at(s.len() - 10);
        let location = head.strip_suffix('-').ok_or_else(bad)?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| bad())?;
        Ok(Self::new(location, date))
    }
}

/// Map-like backing store for one cache tier.
///
/// `put` and `clear` are durable when they return. `stage` only has to be
/// visible to `get`; it becomes durable at the next `flush`.
pub trait CacheStore: fmt::Debug + Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<PrayerTimeSet>, MiqatError>;
    fn put(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError>;
    fn clear(&self) -> Result<(), MiqatError>;
    fn len(&self) -> usize;

    fn stage(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.put(key, value)
    }

    fn flush(&self) -> Result<(), MiqatError> {
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-process store. Sharded, so writers to distinct keys do not contend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<CacheKey, PrayerTimeSet>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Result<Option<PrayerTimeSet>, MiqatError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn clear(&self) -> Result<(), MiqatError> {
        self.entries.clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Store mirrored to a JSON file of `{"<location>-<date>": {...}}`.
///
/// The file is read once at open. `put` and `clear` rewrite it; staged
/// entries are written together by the next `flush`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: DashMap<CacheKey, PrayerTimeSet>,
    dirty: AtomicBool,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Opens (or lazily creates) the store at `path`.
    ///
    /// # Errors
    /// Returns `Storage` if an existing file cannot be read or decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MiqatError> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        match std::fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                let stored: BTreeMap<String, PrayerTimeSet> = serde_json::from_str(&content)
                    .map_err(|e| MiqatError::storage(format!("{}: {}", path.display(), e)))?;
                for (key, value) in stored {
                    match key.parse::<CacheKey>() {
                        Ok(key) => {
                            entries.insert(key, value);
                        }
                        Err(_) => warn!(%key, path = %path.display(), "dropping unreadable cache key"),
                    }
                }
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(MiqatError::storage(format!("{}: {}", path.display(), e))),
        }

        debug!(path = %path.display(), entries = entries.len(), "opened cache file");
        Ok(Self { path, entries, dirty: AtomicBool::new(false), write_lock: Mutex::new(()) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when staged entries have not been written yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    fn write_file(&self) -> Result<(), MiqatError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // Cleared before the snapshot so a concurrent stage re-marks it.
        self.dirty.store(false, Ordering::Release);

        let snapshot: BTreeMap<String, PrayerTimeSet> = self
            .entries
            .iter()
            .map(|entry| (entry.key().to_string(), entry.value().clone()))
            .collect();
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| MiqatError::storage(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        let written = std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &self.path))
            .map_err(|e| MiqatError::storage(format!("{}: {}", self.path.display(), e)));
        if written.is_err() {
            self.dirty.store(true, Ordering::Release);
        }
        written
    }
}

impl CacheStore for JsonFileStore {
    fn get(&self, key: &CacheKey) -> Result<Option<PrayerTimeSet>, MiqatError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.entries.insert(key, value);
        self.write_file()
    }

    fn clear(&self) -> Result<(), MiqatError> {
        self.entries.clear();
        self.write_file()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stage(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.entries.insert(key, value);
        self.dirty.store(true, Ordering::Release);
        Ok(())
    }

    fn flush(&self) -> Result<(), MiqatError> {
        if !self.is_dirty() {
            return Ok(());
        }
        self.write_file()
    }
}

/// Transient tier in front of a longer-lived tier, written through together.
#[derive(Debug, Clone)]
pub struct TieredCache {
    transient: Arc<dyn CacheStore>,
    durable: Arc<dyn CacheStore>,
}

impl Default for TieredCache {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }
}

impl TieredCache {
    pub fn new(transient: Arc<dyn CacheStore>, durable: Arc<dyn CacheStore>) -> Self {
        Self { transient, durable }
    }

    pub fn transient(&self) -> &Arc<dyn CacheStore> {
        &self.transient
    }

    pub fn durable(&self) -> &Arc<dyn CacheStore> {
        &self.durable
    }

    /// Transient first, then durable. A durable hit refills the transient
    /// tier. Store errors count as misses.
    pub fn get(&self, key: &CacheKey) -> Option<PrayerTimeSet> {
        match self.transient.get(key) {
            Ok(Some(hit)) => {
                debug!(%key, tier = "transient", "cache hit");
                return Some(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(%key, error = %e, "transient cache read failed"),
        }

        match self.durable.get(key) {
            Ok(Some(hit)) => {
                debug!(%key, tier = "durable", "cache hit");
                if let Err(e) = self.transient.put(key.clone(), hit.clone()) {
                    warn!(%key, error = %e, "transient cache refill failed");
                }
                Some(hit)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(%key, error = %e, "durable cache read failed");
                None
            }
        }
    }

    /// Writes the durable tier, then the transient tier.
    ///
    /// # Errors
    /// Returns the durable tier's error; the transient tier is then left
    /// untouched so neither tier holds a value the other lacks.
    pub fn put(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.durable.put(key.clone(), value.clone())?;
        self.fill_transient(key, value);
        Ok(())
    }

    /// Like [`put`](Self::put), but the durable write is deferred to
    /// [`flush`](Self::flush).
    pub fn stage(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.durable.stage(key.clone(), value.clone())?;
        self.fill_transient(key, value);
        Ok(())
    }

    /// Makes staged durable entries permanent.
    pub fn flush(&self) -> Result<(), MiqatError> {
        self.durable.flush()
    }

    fn fill_transient(&self, key: CacheKey, value: PrayerTimeSet) {
        // A missing transient entry only costs a durable read later.
        if let Err(e) = self.transient.put(key.clone(), value) {
            warn!(%key, error = %e, "transient cache write failed");
        }
    }

    /// Empties both tiers.
    pub fn clear(&self) {
        if let Err(e) = self.transient.clear() {
            warn!(error = %e, "transient cache clear failed");
        }
        if let Err(e) = self.durable.clear() {
            warn!(error = %e, "durable cache clear failed");
        }
        debug!("cache cleared");
    }
}
