//! Prayer-time resolution service.
//!
//! Resolves the five daily prayer times for a registered location through a
//! two-tier cache and an ordered chain of producers: pinned overrides, remote
//! calculation services (primary, then fallback), and a local astronomical
//! calculator. A daily sync refreshes every location once per date.
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use miqat_core::{PrayerTimeService, ServiceConfig};
//!
//! # async fn run() -> Result<(), miqat_core::MiqatError> {
//! let service = PrayerTimeService::from_config(&ServiceConfig::default())?;
//! let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
//! let times = service.get_prayer_times("Faisalabad", date).await?;
//! println!("Maghrib: {}", times.display().maghrib);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod marker;
pub mod overrides;
pub mod producer;
pub mod remote;
pub mod service;
pub mod sync;

pub use cache::{CacheKey, CacheStore, JsonFileStore, MemoryStore, TieredCache};
pub use config::ServiceConfig;
pub use marker::{FileMarker, MemoryMarker, SyncMarkerStore};
pub use overrides::ExactOverrides;
pub use producer::PrayerTimeProducer;
pub use remote::RemoteResolverChain;
pub use service::{PrayerTimeService, PrayerTimeServiceBuilder};
pub use sync::SyncReport;

pub use miqat_astronomy::{CalculationParams, CorrectionTable, LocalCalculator};
pub use miqat_network::{RemoteEndpoint, TimingsClient};
pub use miqat_types::{
    format_to_12_hour, AsrShadow, ClockTime, DisplayTimes, Location, LocationRegistry, MiqatError, Prayer,
    PrayerTimeSet, TimeSource,
};

pub mod prelude {
    pub use crate::{
        format_to_12_hour, Location, MiqatError, Prayer, PrayerTimeService, PrayerTimeSet, ServiceConfig,
        TimeSource,
    };
}
