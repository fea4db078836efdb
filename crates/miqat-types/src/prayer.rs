use crate::error::MiqatError;
use crate::time::ClockTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five daily prayers, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }

    /// Asr, Maghrib and Isha always fall after noon.
    pub fn is_evening(self) -> bool {
        matches!(self, Prayer::Asr | Prayer::Maghrib | Prayer::Isha)
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which producer generated a [`PrayerTimeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSource {
    /// Pinned value from the exact-override table.
    Override,
    /// Primary remote calculation service.
    PrimaryRemote,
    /// Fallback remote calculation service (alternate convention).
    FallbackRemote,
    /// Local astronomical calculation with corrections.
    #[default]
    Local,
}

impl fmt::Display for TimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimeSource::Override => "exact override",
            TimeSource::PrimaryRemote => "primary remote",
            TimeSource::FallbackRemote => "fallback remote",
            TimeSource::Local => "local calculation",
        };
        f.write_str(s)
    }
}

/// Asr shadow-length convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsrShadow {
    /// Shadow equals object length (factor 1).
    #[default]
    Standard,
    /// Shadow equals twice the object length (factor 2).
    Hanafi,
}

impl AsrShadow {
    pub fn factor(self) -> f64 {
        match self {
            AsrShadow::Standard => 1.0,
            AsrShadow::Hanafi => 2.0,
        }
    }

    /// Value of the remote `school` query parameter.
    pub fn school_code(self) -> u8 {
        match self {
            AsrShadow::Standard => 0,
            AsrShadow::Hanafi => 1,
        }
    }
}

/// Five prayer times for one location on one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerTimeSet {
    #[serde(rename = "Fajr")]
    pub fajr: ClockTime,
    #[serde(rename = "Dhuhr")]
    pub dhuhr: ClockTime,
    #[serde(rename = "Asr")]
    pub asr: ClockTime,
    #[serde(rename = "Maghrib")]
    pub maghrib: ClockTime,
    #[serde(rename = "Isha")]
    pub isha: ClockTime,
    /// Human-readable date label, e.g. `15 Mar 2025`.
    pub date: String,
    #[serde(default)]
    pub source: TimeSource,
}

impl PrayerTimeSet {
    /// Builds a set from times in [`Prayer::ALL`] order.
    pub fn new(times: [ClockTime; 5], date: impl Into<String>, source: TimeSource) -> Self {
        let [fajr, dhuhr, asr, maghrib, isha] = times;
        Self { fajr, dhuhr, asr, maghrib, isha, date: date.into(), source }
    }

    pub fn get(&self, prayer: Prayer) -> ClockTime {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    pub fn times(&self) -> [ClockTime; 5] {
        [self.fajr, self.dhuhr, self.asr, self.maghrib, self.isha]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prayer, ClockTime)> + '_ {
        Prayer::ALL.into_iter().map(move |p| (p, self.get(p)))
    }

    pub fn with_source(mut self, source: TimeSource) -> Self {
        self.source = source;
        self
    }

    /// Fajr < Dhuhr < Asr < Maghrib < Isha on one clock face.
    pub fn is_ordered(&self) -> bool {
        self.times().windows(2).all(|w| w[0] < w[1])
    }

    /// Isha has wrapped past midnight while the first four stay ordered.
    pub fn isha_wraps(&self) -> bool {
        let t = self.times();
        t[..4].windows(2).all(|w| w[0] < w[1]) && self.isha < self.fajr
    }

    /// Enforces the ordering invariant, tolerating an Isha wrap.
    ///
    /// # Errors
    /// Returns `MalformedPayload` naming the first out-of-order pair.
    pub fn validate(&self) -> Result<(), MiqatError> {
        if self.is_ordered() || self.isha_wraps() {
            return Ok(());
        }
        let pairs = Prayer::ALL.windows(2);
        for pair in pairs {
            let (a, b) = (pair[0], pair[1]);
            if self.get(a) >= self.get(b) {
                return Err(MiqatError::malformed(format!(
                    "{} ({}) is not before {} ({})",
                    a,
                    self.get(a),
                    b,
                    self.get(b)
                )));
            }
        }
        Ok(())
    }

    /// 12-hour rendering of the set.
    pub fn display(&self) -> DisplayTimes {
        let wraps = self.isha_wraps();
        let render = |prayer: Prayer| {
            let t = self.get(prayer);
            if prayer.is_evening() && !(prayer == Prayer::Isha && wraps) {
                t.to_12_hour_pm()
            } else {
                t.to_12_hour()
            }
        };
        DisplayTimes {
            fajr: render(Prayer::Fajr),
            dhuhr: render(Prayer::Dhuhr),
            asr: render(Prayer::Asr),
            maghrib: render(Prayer::Maghrib),
            isha: render(Prayer::Isha),
            date: self.date.clone(),
        }
    }
}

impl fmt::Display for PrayerTimeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: Fajr {} | Dhuhr {} | Asr {} | Maghrib {} | Isha {}",
            self.date, self.fajr, self.dhuhr, self.asr, self.maghrib, self.isha
        )
    }
}

/// Display strings for a [`PrayerTimeSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTimes {
    #[serde(rename = "Fajr")]
    pub fajr: String,
    #[serde(rename = "Dhuhr")]
    pub dhuhr: String,
    #[serde(rename = "Asr")]
    pub asr: String,
    #[serde(rename = "Maghrib")]
    pub maghrib: String,
    #[serde(rename = "Isha")]
    pub isha: String,
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    fn sample() -> PrayerTimeSet {
        PrayerTimeSet::new(
            [t("05:03"), t("12:19"), t("15:42"), t("18:17"), t("19:32")],
            "15 Mar 2025",
            TimeSource::Local,
        )
    }

    #[test]
    fn test_ordering() {
        let set = sample();
        assert!(set.is_ordered());
        assert!(!set.isha_wraps());
        assert!(set.validate().is_ok());
    }

    #[test]
    fn test_out_of_order_rejected() {
        let mut set = sample();
        set.asr = t("11:00");
        assert!(!set.is_ordered());
        let err = set.validate().unwrap_err();
        assert!(err.to_string().contains("Dhuhr"));
    }

    #[test]
    fn test_isha_wrap_tolerated() {
        let mut set = sample();
        set.isha = t("00:40");
        assert!(!set.is_ordered());
        assert!(set.isha_wraps());
        assert!(set.validate().is_ok());
        assert_eq!(set.display().isha, "12:40 AM");
    }

    #[test]
    fn test_display_forces_pm() {
        let mut set = sample();
        // A rounding artifact that lands Asr before noon must still read PM.
        set.dhuhr = t("11:58");
        set.asr = t("11:59");
        let display = set.display();
        assert_eq!(display.fajr, "05:03 AM");
        assert_eq!(display.dhuhr, "11:58 AM");
        assert_eq!(display.asr, "11:59 PM");
        assert_eq!(display.maghrib, "06:17 PM");
        assert_eq!(display.isha, "07:32 PM");
    }

    #[test]
    fn test_cache_value_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["Fajr"], "05:03");
        assert_eq!(json["Isha"], "19:32");
        assert_eq!(json["date"], "15 Mar 2025");

        let legacy = r#"{"Fajr":"05:03","Dhuhr":"12:19","Asr":"15:42","Maghrib":"18:17","Isha":"19:32","date":"15 Mar 2025"}"#;
        let parsed: PrayerTimeSet = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed, sample());
    }
}
