use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use miqat_core::prelude::*;
use miqat_core::{
    CacheKey, CacheStore, FileMarker, LocalCalculator, MemoryStore, PrayerTimeProducer, RemoteEndpoint,
    RemoteResolverChain, SyncMarkerStore, TimingsClient,
};
use miqat_types::AsrShadow;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Wraps a producer and counts how often it is asked.
#[derive(Debug)]
struct Counting<P> {
    inner: P,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl<P: PrayerTimeProducer> PrayerTimeProducer for Counting<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn resolve(&self, location: &Location, date: NaiveDate) -> Result<Option<PrayerTimeSet>, MiqatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(location, date).await
    }
}

fn counting_local() -> (Arc<dyn PrayerTimeProducer>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let producer = Counting { inner: LocalCalculator::reference(), calls: calls.clone() };
    (Arc::new(producer), calls)
}

/// Memory store that records how it is written.
#[derive(Debug, Default)]
struct RecordingStore {
    inner: MemoryStore,
    puts: AtomicUsize,
    stages: AtomicUsize,
    flushes: AtomicUsize,
}

impl CacheStore for RecordingStore {
    fn get(&self, key: &CacheKey) -> Result<Option<PrayerTimeSet>, MiqatError> {
        self.inner.get(key)
    }

    fn put(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value)
    }

    fn clear(&self) -> Result<(), MiqatError> {
        self.inner.clear()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn stage(&self, key: CacheKey, value: PrayerTimeSet) -> Result<(), MiqatError> {
        self.stages.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value)
    }

    fn flush(&self) -> Result<(), MiqatError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug)]
struct AlwaysFails;

#[async_trait]
impl PrayerTimeProducer for AlwaysFails {
    fn name(&self) -> &'static str {
        "always-fails"
    }

    async fn resolve(&self, _: &Location, _: NaiveDate) -> Result<Option<PrayerTimeSet>, MiqatError> {
        Err(MiqatError::network("simulated outage"))
    }
}

/// Fails once for one location, then behaves like the local calculator.
#[derive(Debug)]
struct FlakyFor {
    location: &'static str,
    tripped: AtomicBool,
    local: LocalCalculator,
}

#[async_trait]
impl PrayerTimeProducer for FlakyFor {
    fn name(&self) -> &'static str {
        "flaky"
    }

    async fn resolve(&self, location: &Location, date: NaiveDate) -> Result<Option<PrayerTimeSet>, MiqatError> {
        if location.name == self.location && !self.tripped.swap(true, Ordering::SeqCst) {
            return Err(MiqatError::network("transient failure"));
        }
        Ok(Some(self.local.compute(location, date)))
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn timings_body(times: [&str; 5], readable: &str) -> String {
    format!(
        r#"{{"code":200,"data":{{"timings":{{"Fajr":"{}","Sunrise":"06:20","Dhuhr":"{}","Asr":"{}","Maghrib":"{}","Isha":"{}"}},"date":{{"readable":"{}"}}}}}}"#,
        times[0], times[1], times[2], times[3], times[4], readable
    )
}

fn remote_chain(primary: &MockServer, fallback: &MockServer, timeout: Duration) -> Arc<dyn PrayerTimeProducer> {
    let client = TimingsClient::new(timeout, "Asia/Karachi", AsrShadow::Standard).unwrap();
    Arc::new(RemoteResolverChain::new(
        client,
        RemoteEndpoint::new(format!("{}/v1/timings", primary.uri()), 1),
        RemoteEndpoint::new(format!("{}/v1/timings", fallback.uri()), 2),
    ))
}

async fn failing_server(expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

async fn serving(body: String, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let (local, calls) = counting_local();
    let service = PrayerTimeService::builder().producers(vec![local]).build().unwrap();
    let d = date(2025, 3, 16);

    let first = service.get_prayer_times("Faisalabad", d).await.unwrap();
    let second = service.get_prayer_times("Faisalabad", d).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(service.cache().transient().len(), 1);
    assert_eq!(service.cache().durable().len(), 1);
}

#[tokio::test]
async fn exact_override_bypasses_every_other_producer() {
    let primary = serving(timings_body(["04:00", "12:00", "15:00", "18:00", "19:00"], "15 Mar 2025"), 0).await;
    let fallback = serving(timings_body(["04:01", "12:01", "15:01", "18:01", "19:01"], "15 Mar 2025"), 0).await;
    let (local, calls) = counting_local();

    let service = PrayerTimeService::builder()
        .producers(vec![
            Arc::new(miqat_core::ExactOverrides::reference()),
            remote_chain(&primary, &fallback, Duration::from_secs(2)),
            local,
        ])
        .build()
        .unwrap();

    let set = service.get_prayer_times("Faisalabad", date(2025, 3, 15)).await.unwrap();
    assert_eq!(set.source, TimeSource::Override);
    assert_eq!(set.fajr.to_string(), "05:03");
    assert_eq!(set.isha.to_string(), "19:32");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn primary_success_skips_fallback() {
    let primary = serving(timings_body(["05:01", "12:18", "15:42", "18:16", "19:31"], "16 Mar 2025"), 1).await;
    let fallback = serving(timings_body(["04:50", "12:18", "15:42", "18:16", "19:40"], "16 Mar 2025"), 0).await;
    let (local, calls) = counting_local();

    let service = PrayerTimeService::builder()
        .producers(vec![remote_chain(&primary, &fallback, Duration::from_secs(2)), local])
        .build()
        .unwrap();

    let set = service.get_prayer_times("Faisalabad", date(2025, 3, 16)).await.unwrap();
    assert_eq!(set.source, TimeSource::PrimaryRemote);
    assert_eq!(set.fajr.to_string(), "05:01");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fallback_serves_when_primary_fails() {
    let primary = failing_server(1).await;
    let fallback = serving(timings_body(["04:50:30", "12:18", "15:42", "18:16", "19:40"], "16 Mar 2025"), 1).await;
    let (local, calls) = counting_local();

    let service = PrayerTimeService::builder()
        .producers(vec![remote_chain(&primary, &fallback, Duration::from_secs(2)), local])
        .build()
        .unwrap();

    let set = service.get_prayer_times("Faisalabad", date(2025, 3, 16)).await.unwrap();
    assert_eq!(set.source, TimeSource::FallbackRemote);
    assert_eq!(set.fajr.to_string(), "04:50");
    assert_eq!(set.isha.to_string(), "19:40");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn hung_primary_times_out_into_fallback() {
    let primary = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(timings_body(["05:01", "12:18", "15:42", "18:16", "19:31"], "16 Mar 2025"))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&primary)
        .await;
    let fallback = serving(timings_body(["04:50", "12:18", "15:42", "18:16", "19:40"], "16 Mar 2025"), 1).await;

    let service = PrayerTimeService::builder()
        .producers(vec![remote_chain(&primary, &fallback, Duration::from_millis(300))])
        .build()
        .unwrap();

    let set = service.get_prayer_times("Lahore", date(2025, 3, 16)).await.unwrap();
    assert_eq!(set.source, TimeSource::FallbackRemote);
}

#[tokio::test]
async fn total_remote_failure_falls_back_to_local_calculation() {
    let primary = failing_server(1).await;
    let fallback = failing_server(1).await;
    let (local, calls) = counting_local();

    let service = PrayerTimeService::builder()
        .producers(vec![remote_chain(&primary, &fallback, Duration::from_secs(2)), local])
        .build()
        .unwrap();

    let d = date(2025, 3, 16);
    let set = service.get_prayer_times("Faisalabad", d).await.unwrap();

    let faisalabad = service.registry().get("Faisalabad").unwrap().clone();
    assert_eq!(set, LocalCalculator::reference().compute(&faisalabad, d));
    assert_eq!(set.source, TimeSource::Local);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn remote_chain_reports_both_failures() {
    let primary = failing_server(1).await;
    let fallback = failing_server(1).await;
    let client = TimingsClient::new(Duration::from_secs(2), "Asia/Karachi", AsrShadow::Standard).unwrap();
    let chain = RemoteResolverChain::new(
        client,
        RemoteEndpoint::new(primary.uri(), 1),
        RemoteEndpoint::new(fallback.uri(), 2),
    );

    let location = Location::new("Faisalabad", 31.4167, 73.0833);
    let err = chain.resolve_remote(&location, date(2025, 3, 16)).await.unwrap_err();
    match err {
        MiqatError::RemoteUnavailable { primary, fallback } => {
            assert!(primary.contains("500"));
            assert!(fallback.contains("500"));
        }
        other => panic!("expected RemoteUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_location_fails_before_any_work() {
    let (local, calls) = counting_local();
    let service = PrayerTimeService::builder().producers(vec![local]).build().unwrap();

    let err = service.get_prayer_times("Atlantis", date(2025, 3, 16)).await.unwrap_err();
    assert!(matches!(err, MiqatError::InvalidLocation { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(service.cache().transient().is_empty());
}

#[tokio::test]
async fn exhausted_chain_is_unresolvable() {
    let service = PrayerTimeService::builder()
        .producers(vec![Arc::new(AlwaysFails)])
        .build()
        .unwrap();

    let err = service.get_prayer_times("Quetta", date(2025, 3, 16)).await.unwrap_err();
    assert!(matches!(err, MiqatError::UnresolvablePrayerTimes { .. }));
    assert!(service.cache().durable().is_empty());
}

#[tokio::test]
async fn daily_sync_runs_once_per_date() {
    let (local, calls) = counting_local();
    let service = PrayerTimeService::builder().producers(vec![local]).build().unwrap();
    let d = date(2025, 3, 16);

    assert!(service.check_and_sync(d).await);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
    assert_eq!(service.cache().transient().len(), 10);

    assert!(!service.check_and_sync(d).await);
    assert_eq!(calls.load(Ordering::SeqCst), 10);

    // Rollover clears yesterday's entries and resolves the new date.
    let next = d.succ_opt().unwrap();
    assert!(service.check_and_sync(next).await);
    assert_eq!(calls.load(Ordering::SeqCst), 20);
    assert_eq!(service.cache().transient().len(), 10);
    assert_eq!(service.cache().durable().len(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sync_callers_run_one_pass() {
    let (local, calls) = counting_local();
    let service = PrayerTimeService::builder().producers(vec![local]).build().unwrap();
    let d = date(2025, 3, 16);

    let (a, b) = tokio::join!(service.check_and_sync(d), service.check_and_sync(d));
    assert!(a ^ b, "exactly one caller should run the sync");
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn sync_tolerates_single_location_failure() {
    let flaky = FlakyFor {
        location: "Quetta",
        tripped: AtomicBool::new(false),
        local: LocalCalculator::reference(),
    };
    let service = PrayerTimeService::builder().producers(vec![Arc::new(flaky)]).build().unwrap();
    let d = date(2025, 3, 16);

    assert!(service.check_and_sync(d).await);
    assert_eq!(service.cache().transient().len(), 9);
    assert!(!service.check_and_sync(d).await);

    // The failed location is retried on its next cache miss.
    let quetta = service.get_prayer_times("Quetta", d).await.unwrap();
    assert_eq!(quetta.source, TimeSource::Local);
    assert_eq!(service.cache().transient().len(), 10);
}

#[tokio::test]
async fn sync_report_lists_failures() {
    let flaky = FlakyFor {
        location: "Multan",
        tripped: AtomicBool::new(false),
        local: LocalCalculator::reference(),
    };
    let service = PrayerTimeService::builder().producers(vec![Arc::new(flaky)]).build().unwrap();

    let report = service.sync_all(date(2025, 3, 16)).await;
    assert_eq!(report.resolved.len(), 9);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "Multan");
    assert!(!report.is_complete());
}

#[tokio::test]
async fn persisted_marker_suppresses_resync() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_synced");
    let d = date(2025, 3, 16);
    FileMarker::new(&path).save(d).unwrap();

    let (local, calls) = counting_local();
    let service = PrayerTimeService::builder()
        .producers(vec![local])
        .marker_store(Arc::new(FileMarker::new(&path)))
        .build()
        .unwrap();

    assert!(!service.check_and_sync(d).await);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert!(service.check_and_sync(d.succ_opt().unwrap()).await);
    assert_eq!(FileMarker::new(&path).load().unwrap(), d.succ_opt());
}

#[tokio::test]
async fn durable_file_tier_survives_restart() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let config = ServiceConfig::new()
        .remote_enabled(false)
        .cache_path(dir.path().join("cache.json"))
        .marker_path(dir.path().join("last_synced"));
    let d = date(2025, 3, 16);

    let first = PrayerTimeService::from_config(&config)?;
    let original = first.get_prayer_times("Peshawar", d).await?;
    drop(first);

    let restarted = PrayerTimeService::from_config(&config)?;
    assert!(restarted.cache().transient().is_empty());
    assert_eq!(restarted.cache().durable().len(), 1);

    let cached = restarted.get_prayer_times("Peshawar", d).await?;
    assert_eq!(cached, original);
    assert_eq!(restarted.cache().transient().len(), 1);
    Ok(())
}

#[tokio::test]
async fn times_for_today_syncs_the_registry() {
    let (local, calls) = counting_local();
    let service = PrayerTimeService::builder().producers(vec![local]).build().unwrap();

    let set = service.times_for_today("Karachi").await.unwrap();
    assert!(set.is_ordered());
    assert_eq!(calls.load(Ordering::SeqCst), 10);

    let again = service.times_for_today("Karachi").await.unwrap();
    assert_eq!(again, set);
    assert_eq!(calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn times_for_today_rejects_unknown_location_without_syncing() {
    let (local, calls) = counting_local();
    let service = PrayerTimeService::builder().producers(vec![local]).build().unwrap();

    assert!(service.times_for_today("Atlantis").await.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sync_pass_flushes_durable_tier_once() {
    let durable = Arc::new(RecordingStore::default());
    let service = PrayerTimeService::builder()
        .durable_store(durable.clone())
        .build()
        .unwrap();

    assert!(service.check_and_sync(date(2025, 3, 16)).await);
    assert_eq!(durable.len(), 10);
    assert_eq!(durable.stages.load(Ordering::SeqCst), 10);
    assert_eq!(durable.puts.load(Ordering::SeqCst), 0);
    assert_eq!(durable.flushes.load(Ordering::SeqCst), 1);

    // Outside a sync pass a miss is written through immediately.
    service.get_prayer_times("Lahore", date(2025, 3, 17)).await.unwrap();
    assert_eq!(durable.puts.load(Ordering::SeqCst), 1);
    assert_eq!(durable.flushes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn sync_pass_persists_every_location_to_file() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("cache.json");
    let config = ServiceConfig::new().remote_enabled(false).cache_path(&path);

    let service = PrayerTimeService::from_config(&config)?;
    assert!(service.check_and_sync(date(2025, 3, 16)).await);
    assert!(!service.cache().transient().is_empty());

    let reopened = miqat_core::JsonFileStore::open(&path)?;
    assert_eq!(reopened.len(), 10);
    assert!(!reopened.is_dirty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_for_one_key_agree() {
    let service = PrayerTimeService::builder().build().unwrap();
    let d = date(2025, 3, 16);

    let (a, b) = tokio::join!(
        service.get_prayer_times("Lahore", d),
        service.get_prayer_times("Lahore", d)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a, b);
    assert_eq!(service.cache().transient().len(), 1);
    assert_eq!(service.cache().durable().len(), 1);
    assert_eq!(service.cache().get(&CacheKey::new("Lahore", d)), Some(a));
}
