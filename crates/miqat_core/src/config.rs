//! Service configuration, loadable from TOML.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use miqat_network::{RemoteEndpoint, METHOD_ISNA, METHOD_KARACHI};
use miqat_types::{AsrShadow, GeoCoordinate, Location, LocationRegistry, MiqatError};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PRIMARY_URL: &str = "https://api.aladhan.com/v1/timings";
pub const DEFAULT_FALLBACK_URL: &str = "https://aladhan.api.islamic.network/v1/timings";

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Fixed offset of the region's clock from UTC, hours. No DST.
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: f64,

    /// IANA zone name sent to the remote services.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Asr convention for both local and remote calculation.
    #[serde(default)]
    pub asr_shadow: AsrShadow,

    #[serde(default = "default_primary")]
    pub primary: RemoteEndpoint,

    #[serde(default = "default_fallback")]
    pub fallback: RemoteEndpoint,

    /// Per-request timeout for remote calls, seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// When false the remote chain is skipped entirely.
    #[serde(default = "default_true")]
    pub remote_enabled: bool,

    #[serde(default = "LocationRegistry::reference_locations")]
    pub locations: Vec<Location>,

    /// JSON file backing the longer-lived cache tier.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// Text file holding the last-synced date.
    #[serde(default)]
    pub marker_path: Option<PathBuf>,
}

fn default_utc_offset() -> f64 {
    5.0
}

fn default_timezone() -> String {
    "Asia/Karachi".to_string()
}

fn default_primary() -> RemoteEndpoint {
    RemoteEndpoint::new(DEFAULT_PRIMARY_URL, METHOD_KARACHI)
}

fn default_fallback() -> RemoteEndpoint {
    RemoteEndpoint::new(DEFAULT_FALLBACK_URL, METHOD_ISNA)
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset(),
            timezone: default_timezone(),
            asr_shadow: AsrShadow::default(),
            primary: default_primary(),
            fallback: default_fallback(),
            request_timeout_secs: default_timeout_secs(),
            remote_enabled: true,
            locations: LocationRegistry::reference_locations(),
            cache_path: None,
            marker_path: None,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates TOML.
    pub fn from_toml_str(s: &str) -> Result<Self, MiqatError> {
        let config: Self = toml::from_str(s).map_err(|e| MiqatError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MiqatError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| MiqatError::invalid_config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn utc_offset_hours(mut self, offset: f64) -> Self {
        self.utc_offset_hours = offset;
        self
    }

    pub fn asr_shadow(mut self, shadow: AsrShadow) -> Self {
        self.asr_shadow = shadow;
        self
    }

    pub fn primary(mut self, endpoint: RemoteEndpoint) -> Self {
        self.primary = endpoint;
        self
    }

    pub fn fallback(mut self, endpoint: RemoteEndpoint) -> Self {
        self.fallback = endpoint;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn remote_enabled(mut self, enabled: bool) -> Self {
        self.remote_enabled = enabled;
        self
    }

    pub fn locations(mut self, locations: Vec<Location>) -> Self {
        self.locations = locations;
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn marker_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.marker_path = Some(path.into());
        self
    }

    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> Result<(), MiqatError> {
        let mut issues: Vec<String> = Vec::new();

        if !self.utc_offset_hours.is_finite() || !(-12.0..=14.0).contains(&self.utc_offset_hours) {
            issues.push("utc_offset_hours must be within [-12, 14]".into());
        }
        if self.timezone.trim().is_empty() {
            issues.push("timezone must not be empty".into());
        }
        if self.request_timeout_secs == 0 {
            issues.push("request_timeout_secs must be > 0".into());
        }
        if self.remote_enabled {
            if self.primary.base_url.trim().is_empty() {
                issues.push("primary.base_url must not be empty".into());
            }
            if self.fallback.base_url.trim().is_empty() {
                issues.push("fallback.base_url must not be empty".into());
            }
        }
        if self.locations.is_empty() {
            issues.push("locations must contain at least one location".into());
        }

        let mut seen = HashSet::new();
        for loc in &self.locations {
            if !seen.insert(loc.name.as_str()) {
                issues.push(format!("duplicate location {:?}", loc.name));
            }
            if GeoCoordinate::new(loc.lat, loc.lng).is_err() {
                issues.push(format!("location {:?} has invalid coordinates", loc.name));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(MiqatError::invalid_config(issues.join("; ")))
        }
    }

    pub fn registry(&self) -> Result<LocationRegistry, MiqatError> {
        LocationRegistry::new(self.locations.clone())
    }
}
