//! Local Prayer-Time Calculator.
//!
//! Applies the solar position model with a fixed angle set, then shifts the
//! result by the per-location correction table.

use chrono::NaiveDate;
use miqat_types::time::decimal_hours_to_minutes;
use miqat_types::{readable_date, AsrShadow, ClockTime, GeoCoordinate, Location, PrayerTimeSet, TimeSource};
use tracing::debug;

use crate::correction::CorrectionTable;
use crate::solar::{asr_altitude, hour_angle_offset, solar_position, SUNSET_ALTITUDE};

/// Sun altitude at Fajr, degrees.
pub const FAJR_ANGLE: f64 = -18.0;
/// Sun altitude at Isha, degrees.
pub const ISHA_ANGLE: f64 = -17.0;
/// Pakistan Standard Time.
pub const DEFAULT_UTC_OFFSET_HOURS: f64 = 5.0;

/// Angle set and clock convention for the calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculationParams {
    pub fajr_angle: f64,
    pub isha_angle: f64,
    pub asr_shadow: AsrShadow,
    pub utc_offset_hours: f64,
}

impl Default for CalculationParams {
    fn default() -> Self {
        Self {
            fajr_angle: FAJR_ANGLE,
            isha_angle: ISHA_ANGLE,
            asr_shadow: AsrShadow::Standard,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
        }
    }
}

impl CalculationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn asr_shadow(mut self, shadow: AsrShadow) -> Self {
        self.asr_shadow = shadow;
        self
    }

    pub fn utc_offset_hours(mut self, offset: f64) -> Self {
        self.utc_offset_hours = offset;
        self
    }
}

/// Uncorrected times in decimal hours on the local clock. Values may fall
/// outside [0, 24) before wrapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPrayerTimes {
    pub fajr: f64,
    pub dhuhr: f64,
    pub asr: f64,
    pub maghrib: f64,
    pub isha: f64,
}

impl RawPrayerTimes {
    pub fn as_array(&self) -> [f64; 5] {
        [self.fajr, self.dhuhr, self.asr, self.maghrib, self.isha]
    }
}

/// Calculates raw prayer times for a given date and position.
///
/// # Arguments
/// * `date` - The Gregorian date
/// * `coords` - Geographic coordinates (latitude, longitude)
/// * `params` - Angle set, Asr convention and UTC offset
///
/// # Example
/// ```rust
/// use chrono::NaiveDate;
/// use miqat_types::GeoCoordinate;
/// use miqat_astronomy::calculator::{calculate_prayer_times, CalculationParams};
///
/// let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
/// let faisalabad = GeoCoordinate::new(31.4167, 73.0833).unwrap();
///
/// let raw = calculate_prayer_times(date, faisalabad, &CalculationParams::default());
/// assert!(raw.fajr < raw.dhuhr && raw.maghrib < raw.isha);
/// ```
pub fn calculate_prayer_times(
    date: NaiveDate,
    coords: GeoCoordinate,
    params: &CalculationParams,
) -> RawPrayerTimes {
    let sun = solar_position(coords, date, params.utc_offset_hours);
    let noon = sun.solar_noon_hour;
    let dec = sun.declination;

    let asr_alt = asr_altitude(coords.lat, dec, params.asr_shadow.factor());

    RawPrayerTimes {
        fajr: noon - hour_angle_offset(coords.lat, dec, params.fajr_angle),
        dhuhr: noon,
        asr: noon + hour_angle_offset(coords.lat, dec, asr_alt),
        maghrib: noon + hour_angle_offset(coords.lat, dec, SUNSET_ALTITUDE),
        isha: noon + hour_angle_offset(coords.lat, dec, params.isha_angle),
    }
}

/// Local producer: astronomy plus corrections.
#[derive(Debug, Clone, Default)]
pub struct LocalCalculator {
    params: CalculationParams,
    corrections: CorrectionTable,
}

impl LocalCalculator {
    pub fn new(params: CalculationParams, corrections: CorrectionTable) -> Self {
        Self { params, corrections }
    }

    /// Reference deployment: default angles and the built-in correction table.
    pub fn reference() -> Self {
        Self::new(CalculationParams::default(), CorrectionTable::reference())
    }

    pub fn params(&self) -> &CalculationParams {
        &self.params
    }

    pub fn corrections(&self) -> &CorrectionTable {
        &self.corrections
    }

    /// Computes the corrected set for `location` on `date`. Never fails;
    /// polar geometry yields a degenerate but complete set.
    pub fn compute(&self, location: &Location, date: NaiveDate) -> PrayerTimeSet {
        let raw = calculate_prayer_times(date, location.coords(), &self.params);
        let offsets = self.corrections.offsets(&location.name);

        let mut times = [ClockTime::MIDNIGHT; 5];
        for (slot, (hours, offset)) in times.iter_mut().zip(raw.as_array().into_iter().zip(offsets)) {
            *slot = ClockTime::from_minutes(decimal_hours_to_minutes(hours) + i64::from(offset));
        }

        debug!(location = %location.name, %date, ?offsets, "computed local prayer times");
        PrayerTimeSet::new(times, readable_date(date), TimeSource::Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faisalabad() -> Location {
        Location::new("Faisalabad", 31.4167, 73.0833)
    }

    fn hhmm(set: &PrayerTimeSet) -> [String; 5] {
        set.times().map(|t| t.to_string())
    }

    #[test]
    fn test_faisalabad_reference_set() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let set = LocalCalculator::reference().compute(&faisalabad(), date);

        assert_eq!(hhmm(&set), ["05:03", "12:19", "15:42", "18:17", "19:32"]);
        assert_eq!(set.date, "15 Mar 2025");
        assert_eq!(set.source, TimeSource::Local);
    }

    #[test]
    fn test_uncorrected_output() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let calc = LocalCalculator::new(CalculationParams::default(), CorrectionTable::empty());
        let set = calc.compute(&faisalabad(), date);

        assert_eq!(hhmm(&set), ["05:00", "12:17", "15:41", "18:14", "19:30"]);
    }

    #[test]
    fn test_hanafi_asr_is_later() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let params = CalculationParams::new().asr_shadow(AsrShadow::Hanafi);
        let hanafi = LocalCalculator::new(params, CorrectionTable::empty()).compute(&faisalabad(), date);
        let standard = LocalCalculator::new(CalculationParams::default(), CorrectionTable::empty())
            .compute(&faisalabad(), date);

        let delay = hanafi.asr.minutes_since_midnight() - standard.asr.minutes_since_midnight();
        assert!((45..=60).contains(&delay), "Asr delay was {delay} minutes");
        assert_eq!(hanafi.fajr, standard.fajr);
        assert_eq!(hanafi.isha, standard.isha);
    }

    #[test]
    fn test_summer_solstice_ordering() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let calc = LocalCalculator::new(CalculationParams::default(), CorrectionTable::empty());
        let set = calc.compute(&faisalabad(), date);

        assert_eq!(hhmm(&set), ["03:24", "12:09", "15:48", "19:15", "20:48"]);
        assert!(set.is_ordered());
    }

    #[test]
    fn test_polar_day_saturates() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
        let params = CalculationParams::new().utc_offset_hours(1.0);
        let calc = LocalCalculator::new(params, CorrectionTable::empty());
        let set = calc.compute(&Location::new("Longyearbyen", 78.0, 15.0), date);

        // Fajr, Maghrib and Isha all sit 12 hours from noon.
        assert_eq!(set.dhuhr.to_string(), "12:02");
        assert_eq!(set.fajr.to_string(), "00:02");
        assert_eq!(set.maghrib, set.fajr);
        assert_eq!(set.isha, set.fajr);
    }
}
