//! Daily Sync Scheduler.
//!
//! On the first request of a new date the cache is cleared and every
//! registered location is resolved again, concurrently.

use chrono::NaiveDate;
use futures::future::join_all;
use miqat_types::TimeSource;
use tracing::{info, warn};

use crate::service::{Persist, PrayerTimeService};

/// Outcome of one full sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub date: Option<NaiveDate>,
    pub resolved: Vec<(String, TimeSource)>,
    pub failed: Vec<(String, String)>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl PrayerTimeService {
    /// Syncs if `today` differs from the last synced date.
    ///
    /// Returns `true` when a sync pass ran. Concurrent callers for the same
    /// day wait on the marker lock and then return `false`. The marker is
    /// written even when some locations failed; those locations are resolved
    /// again on their next cache miss.
    pub async fn check_and_sync(&self, today: NaiveDate) -> bool {
        let mut marker = self.inner.sync_marker.lock().await;
        if *marker == Some(today) {
            return false;
        }

        let cleared = self
            .with_cache_blocking(|cache| {
                cache.clear();
                Ok(())
            })
            .await;
        if let Err(e) = cleared {
            warn!(%today, error = %e, "cache clear failed before sync");
        }
        let report = self.sync_all(today).await;

        if report.is_complete() {
            info!(%today, locations = report.resolved.len(), "daily sync complete");
        } else {
            let failed: Vec<&str> = report.failed.iter().map(|(name, _)| name.as_str()).collect();
            warn!(%today, resolved = report.resolved.len(), ?failed, "daily sync finished with failures");
        }

        *marker = Some(today);
        if let Err(e) = self.inner.marker_store.save(today) {
            warn!(%today, error = %e, "failed to persist sync marker");
        }
        true
    }

    /// Resolves every registered location for `date`.
    ///
    /// Each location runs as its own task, so a dropped caller does not cancel
    /// resolutions already in flight; they still land in the cache. Durable
    /// writes are staged and flushed once at the end of the pass.
    pub async fn sync_all(&self, date: NaiveDate) -> SyncReport {
        let handles: Vec<_> = self
            .registry()
            .iter()
            .map(|location| {
                let service = self.clone();
                let name = location.name.clone();
                tokio::spawn(async move {
                    let result = service.lookup_or_resolve(&name, date, Persist::Deferred).await;
                    (name, result)
                })
            })
            .collect();

        let names: Vec<String> = self.registry().iter().map(|l| l.name.clone()).collect();
        let mut report = SyncReport { date: Some(date), ..Default::default() };

        for (joined, name) in join_all(handles).await.into_iter().zip(names) {
            match joined {
                Ok((name, Ok(set))) => report.resolved.push((name, set.source)),
                Ok((name, Err(e))) => {
                    warn!(location = %name, %date, error = %e, "sync failed for location");
                    report.failed.push((name, e.to_string()));
                }
                Err(e) => {
                    warn!(location = %name, %date, error = %e, "sync task aborted");
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        if let Err(e) = self.with_cache_blocking(|cache| cache.flush()).await {
            warn!(%date, error = %e, "failed to persist synced prayer times");
        }
        report
    }
}
