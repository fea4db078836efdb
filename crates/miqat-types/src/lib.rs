//! Core value types shared by the miqat crates.

pub mod error;
pub mod location;
pub mod prayer;
pub mod time;

pub use error::MiqatError;
pub use location::{GeoCoordinate, Location, LocationRegistry};
pub use prayer::{AsrShadow, DisplayTimes, Prayer, PrayerTimeSet, TimeSource};
pub use time::{format_to_12_hour, ClockTime};

/// Human-readable label for a date, e.g. `15 Mar 2025`.
pub fn readable_date(date: chrono::NaiveDate) -> String {
    date.format("%d %b %Y").to_string()
}
