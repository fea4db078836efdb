//! HTTP client for remote prayer-time calculation services.

use std::time::Duration;

use chrono::NaiveDate;
use miqat_types::{readable_date, AsrShadow, Location, MiqatError, PrayerTimeSet, TimeSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::response::parse_payload;

/// University of Islamic Sciences, Karachi.
pub const METHOD_KARACHI: u8 = 1;
/// Islamic Society of North America.
pub const METHOD_ISNA: u8 = 2;

/// No service-side tuning for any of the nine tunable times.
const ZERO_TUNE: &str = "0,0,0,0,0,0,0,0,0";

/// One remote service and the convention it is asked to compute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEndpoint {
    /// Full URL of the timings resource.
    pub base_url: String,
    /// Juristic method code understood by the service.
    pub method: u8,
}

impl RemoteEndpoint {
    pub fn new(base_url: impl Into<String>, method: u8) -> Self {
        Self { base_url: base_url.into(), method }
    }
}

/// Shared HTTP client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct TimingsClient {
    client: reqwest::Client,
    timezone: String,
    shadow: AsrShadow,
}

impl TimingsClient {
    /// Builds the client.
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, timezone: impl Into<String>, shadow: AsrShadow) -> Result<Self, MiqatError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("miqat/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| MiqatError::invalid_config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timezone: timezone.into(), shadow })
    }

    /// Requests the five times for `location` on `date` from `endpoint`.
    ///
    /// The request pins zero adjustments so the service's own tuning never
    /// stacks with local corrections.
    ///
    /// # Errors
    /// - `Network` on transport failure, timeout or non-2xx status
    /// - `MalformedPayload` when the body cannot be normalized
    pub async fn fetch(
        &self,
        endpoint: &RemoteEndpoint,
        location: &Location,
        date: NaiveDate,
        source: TimeSource,
    ) -> Result<PrayerTimeSet, MiqatError> {
        let iso_date = date.format("%Y-%m-%d").to_string();
        let query = [
            ("latitude", location.lat.to_string()),
            ("longitude", location.lng.to_string()),
            ("date", iso_date),
            ("method", endpoint.method.to_string()),
            ("school", self.shadow.school_code().to_string()),
            ("tune", ZERO_TUNE.to_string()),
            ("timezonestring", self.timezone.clone()),
        ];

        debug!(url = %endpoint.base_url, location = %location.name, %date, method = endpoint.method, "requesting remote timings");

        let response = self
            .client
            .get(&endpoint.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MiqatError::network(format!("{} timed out", endpoint.base_url))
                } else {
                    MiqatError::network(format!("{} request failed: {}", endpoint.base_url, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(MiqatError::network(format!(
                "{} returned {}: {}",
                endpoint.base_url,
                status.as_u16(),
                snippet
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| MiqatError::network(format!("{} body read failed: {}", endpoint.base_url, e)))?;

        parse_payload(&body)?.into_set(readable_date(date), source)
    }
}
