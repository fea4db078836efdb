//! Time-of-day representation and display formatting.

use crate::error::MiqatError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Minute-resolution time of day on a 24-hour clock face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ClockTime {
    minutes: u16,
}

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime { minutes: 0 };

    /// Wraps any minute count onto the clock face.
    pub fn from_minutes(total: i64) -> Self {
        Self { minutes: total.rem_euclid(MINUTES_PER_DAY) as u16 }
    }

    /// Strict constructor.
    ///
    /// # Errors
    /// Returns `InvalidTime` if `hour > 23` or `minute > 59`.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, MiqatError> {
        if hour > 23 || minute > 59 {
            return Err(MiqatError::invalid_time(format!("{}:{}", hour, minute)));
        }
        Ok(Self { minutes: (hour * 60 + minute) as u16 })
    }

    /// Clamps each field into range instead of failing.
    pub fn clamped(hour: i64, minute: i64) -> Self {
        let h = hour.clamp(0, 23);
        let m = minute.clamp(0, 59);
        Self { minutes: (h * 60 + m) as u16 }
    }

    /// Converts decimal hours to the nearest whole minute, modulo 24 hours.
    ///
    /// Non-finite input maps to midnight.
    pub fn from_decimal_hours(hours: f64) -> Self {
        Self::from_minutes(decimal_hours_to_minutes(hours))
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.minutes / 60)
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.minutes % 60)
    }

    pub fn minutes_since_midnight(&self) -> u32 {
        u32::from(self.minutes)
    }

    pub fn as_decimal_hours(&self) -> f64 {
        f64::from(self.minutes) / 60.0
    }

    /// Shifts by a signed number of minutes, wrapping around midnight.
    pub fn add_minutes(self, delta: i64) -> Self {
        Self::from_minutes(i64::from(self.minutes) + delta)
    }

    /// `HH:MM AM/PM`, with hour 0 shown as 12 AM.
    pub fn to_12_hour(&self) -> String {
        let meridiem = if self.hour() < 12 { "AM" } else { "PM" };
        format!("{:02}:{:02} {}", twelve_hour(self.hour()), self.minute(), meridiem)
    }

    /// Like [`to_12_hour`](Self::to_12_hour) but always labelled PM.
    pub fn to_12_hour_pm(&self) -> String {
        format!("{:02}:{:02} PM", twelve_hour(self.hour()), self.minute())
    }
}

/// Rounded whole minutes for a decimal-hour value; 0 for NaN or infinity.
pub fn decimal_hours_to_minutes(hours: f64) -> i64 {
    if hours.is_finite() {
        (hours * 60.0).round() as i64
    } else {
        0
    }
}

fn twelve_hour(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

fn split_fields(s: &str) -> Option<(i64, i64)> {
    let mut parts = s.trim().split(':');
    let h = parts.next()?.trim().parse::<i64>().ok()?;
    let m = parts.next()?.trim().parse::<i64>().ok()?;
    // Seconds are accepted and truncated.
    if let Some(sec) = parts.next() {
        sec.trim().parse::<u32>().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some((h, m))
}

impl FromStr for ClockTime {
    type Err = MiqatError;

    /// Parses `HH:MM` or `HH:MM:SS` (24-hour).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = split_fields(s).ok_or_else(|| MiqatError::invalid_time(s))?;
        if !(0..=23).contains(&h) || !(0..=59).contains(&m) {
            return Err(MiqatError::invalid_time(s));
        }
        Self::from_hm(h as u32, m as u32)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Converts a 24-hour `HH:MM` string to `HH:MM AM/PM`.
///
/// Out-of-range fields are clamped (`"27:75"` renders as `"11:59 PM"`).
///
/// # Errors
/// Returns `InvalidTime` if the input is not two colon-separated integers.
pub fn format_to_12_hour(value: &str) -> Result<String, MiqatError> {
    let (h, m) = split_fields(value).ok_or_else(|| MiqatError::invalid_time(value))?;
    Ok(ClockTime::clamped(h, m).to_12_hour())
}
