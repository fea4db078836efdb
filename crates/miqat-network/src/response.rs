//! Remote response payloads and their normalization.

use miqat_types::{ClockTime, MiqatError, PrayerTimeSet, TimeSource};
use serde::Deserialize;

/// Accepts both `{"data": {...}}` and the bare payload.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { data: TimingsPayload },
    Bare(TimingsPayload),
}

#[derive(Debug, Deserialize)]
pub struct TimingsPayload {
    pub timings: Timings,
    #[serde(default)]
    pub date: Option<DateInfo>,
}

/// Times as sent by the service, e.g. `"05:12"`, `"05:12:40"` or `"05:12 (PKT)"`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Timings {
    pub fajr: String,
    pub dhuhr: String,
    pub asr: String,
    pub maghrib: String,
    pub isha: String,
}

#[derive(Debug, Deserialize)]
pub struct DateInfo {
    pub readable: String,
}

/// Decodes a response body into a payload.
///
/// # Errors
/// Returns `MalformedPayload` when the body is not JSON or lacks `timings`.
pub fn parse_payload(body: &str) -> Result<TimingsPayload, MiqatError> {
    match serde_json::from_str::<Envelope>(body) {
        Ok(Envelope::Wrapped { data }) => Ok(data),
        Ok(Envelope::Bare(payload)) => Ok(payload),
        Err(e) => Err(MiqatError::malformed(format!("unexpected response body: {}", e))),
    }
}

/// Parses one remote time string, dropping any trailing zone annotation.
pub fn normalize_clock(raw: &str) -> Result<ClockTime, MiqatError> {
    let token = raw.split_whitespace().next().unwrap_or(raw);
    let token = token.split('(').next().unwrap_or(token);
    token
        .parse()
        .map_err(|_| MiqatError::malformed(format!("unparseable time {:?}", raw)))
}

impl TimingsPayload {
    /// Converts to a validated set. `fallback_label` is used when the payload
    /// carries no readable date.
    pub fn into_set(self, fallback_label: String, source: TimeSource) -> Result<PrayerTimeSet, MiqatError> {
        let t = &self.timings;
        let times = [
            normalize_clock(&t.fajr)?,
            normalize_clock(&t.dhuhr)?,
            normalize_clock(&t.asr)?,
            normalize_clock(&t.maghrib)?,
            normalize_clock(&t.isha)?,
        ];
        let label = self.date.map(|d| d.readable).unwrap_or(fallback_label);

        let set = PrayerTimeSet::new(times, label, source);
        set.validate()?;
        Ok(set)
    }
}
