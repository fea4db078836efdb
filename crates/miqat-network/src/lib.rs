//! Network module for remote prayer-time services.
//!
//! Builds requests against Aladhan-compatible timings endpoints and
//! normalizes their responses into [`miqat_types::PrayerTimeSet`].

pub mod remote;
pub mod response;

pub use remote::{RemoteEndpoint, TimingsClient, METHOD_ISNA, METHOD_KARACHI};
