//! # Miqat
//!
//! Resolves the five daily prayer times (Fajr, Dhuhr, Asr, Maghrib, Isha)
//! for a fixed registry of cities.
//!
//! This crate is a facade that re-exports functionality from the `miqat` ecosystem.
//!
//! ## Modules
//!
//! - `service`: `PrayerTimeService` entry point and its builder
//! - `producer`: the ordered producer strategy trait
//! - `overrides`: pinned exact-day times
//! - `remote`: primary and fallback remote services
//! - `cache`: two-tier cache and its stores
//! - `marker`: last-synced date persistence
//! - `sync`: daily sync of every registered location
//! - `config`: TOML service configuration
//!
//! Value types (`PrayerTimeSet`, `ClockTime`, `Location`, ...) and the local
//! calculator are re-exported at the crate root.
//!
//! ## Usage
//!
//! ```rust
//! use miqat::prelude::*;
//! use chrono::NaiveDate;
//!
//! let service = PrayerTimeService::builder().build().unwrap();
//! let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let times = rt.block_on(service.get_prayer_times("Lahore", date)).unwrap();
//! assert_eq!(times.source, TimeSource::Override);
//! ```

pub use miqat_core::*;
