//! Astronomical prayer-time calculation for miqat.
//!
//! - `solar`: declination, equation of time, solar noon, hour-angle offsets
//! - `calculator`: the five prayer times from a fixed angle set
//! - `correction`: per-location minute offsets against a reference timetable

pub mod calculator;
pub mod correction;
pub mod solar;

pub use calculator::{calculate_prayer_times, CalculationParams, LocalCalculator, RawPrayerTimes};
pub use correction::CorrectionTable;
pub use solar::{hour_angle_offset, solar_position, SolarPosition};
