//! Solar Position Model.
//!
//! Low-precision approximations of the sun's declination and the equation of
//! time, good to roughly a minute of clock time. No I/O and no state.

use chrono::{Datelike, NaiveDate};
use miqat_types::GeoCoordinate;

/// Sun altitude at apparent sunset: refraction plus solar semi-diameter.
pub const SUNSET_ALTITUDE: f64 = -0.833;

/// Hour-angle offset returned when the sun never reaches the target altitude.
pub const SATURATED_OFFSET_HOURS: f64 = 12.0;

/// Maximum solar declination (obliquity of the ecliptic), degrees.
const OBLIQUITY: f64 = 23.4397;

/// Solar quantities for one date at one place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolarPosition {
    /// Declination in degrees.
    pub declination: f64,
    /// Apparent minus mean solar time, minutes.
    pub equation_of_time_minutes: f64,
    /// Local clock time of transit, decimal hours.
    pub solar_noon_hour: f64,
}

/// 1-indexed day of the year.
pub fn day_of_year(date: NaiveDate) -> u32 {
    date.ordinal()
}

/// Declination in degrees for a 1-indexed day of the year.
pub fn declination(day_of_year: u32) -> f64 {
    let angle = 360.0 / 365.25 * (284.0 + f64::from(day_of_year));
    OBLIQUITY * angle.to_radians().sin()
}

/// Equation of time in minutes, from the mean anomaly and mean longitude.
pub fn equation_of_time(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
    let n = (date - epoch).num_days() as f64;

    let mean_anomaly = (357.5291 + 0.98560028 * n).rem_euclid(360.0).to_radians();
    let mean_longitude = (280.459 + 0.98564736 * n).rem_euclid(360.0).to_radians();

    -7.659 * mean_anomaly.sin() + 9.863 * (2.0 * mean_longitude).sin()
}

/// Computes declination, equation of time and local solar noon.
///
/// `utc_offset_hours` is the fixed standard offset of the region's clock;
/// daylight saving is not applied.
pub fn solar_position(coords: GeoCoordinate, date: NaiveDate, utc_offset_hours: f64) -> SolarPosition {
    let declination = declination(day_of_year(date));
    let eot = equation_of_time(date);
    let solar_noon_hour = 12.0 - coords.lng / 15.0 + utc_offset_hours - eot / 60.0;

    SolarPosition {
        declination,
        equation_of_time_minutes: eot,
        solar_noon_hour,
    }
}

/// Hours between solar noon and the moment the sun sits at `altitude` degrees.
///
/// Negative altitudes are below the horizon (-18 for astronomical twilight).
/// When the sun never crosses that altitude on this day the offset saturates
/// at [`SATURATED_OFFSET_HOURS`].
pub fn hour_angle_offset(latitude: f64, declination: f64, altitude: f64) -> f64 {
    let (lat, dec) = (latitude.to_radians(), declination.to_radians());
    let cos_h = (altitude.to_radians().sin() - lat.sin() * dec.sin()) / (lat.cos() * dec.cos());

    if !(-1.0..=1.0).contains(&cos_h) {
        return SATURATED_OFFSET_HOURS;
    }
    cos_h.acos().to_degrees() / 15.0
}

/// Sun altitude (degrees) at which an object's shadow is `shadow_factor`
/// times its length plus its noon shadow.
pub fn asr_altitude(latitude: f64, declination: f64, shadow_factor: f64) -> f64 {
    let noon_shadow = (latitude - declination).abs().to_radians().tan();
    (1.0 / (shadow_factor + noon_shadow)).atan().to_degrees()
}
