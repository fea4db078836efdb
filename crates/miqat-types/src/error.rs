use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from miqat operations.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum MiqatError {
    /// Location name not present in the registry.
    #[error("Unknown location: {name}")]
    InvalidLocation { name: String },

    /// Coordinates outside [-90, 90] x [-180, 180].
    #[error("Invalid coordinate ({lat}, {lng})")]
    InvalidCoordinate { lat: f64, lng: f64 },

    /// A clock time that is not `HH:MM` or `HH:MM:SS`.
    #[error("Invalid time of day: {value:?}")]
    InvalidTime { value: String },

    /// Both the primary and the fallback remote service failed.
    #[error("Remote services unavailable (primary: {primary}; fallback: {fallback})")]
    RemoteUnavailable { primary: String, fallback: String },

    /// Every producer in the chain failed.
    #[error("Could not resolve prayer times for {location} on {date}")]
    UnresolvablePrayerTimes { location: String, date: NaiveDate },

    /// Transport-level failure, timeout or non-success status.
    #[error("Network error: {0}")]
    Network(String),

    /// Remote payload that does not carry the expected timings.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Cache or marker backing store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl MiqatError {
    /// Creates an `InvalidLocation` error.
    pub fn invalid_location(name: impl Into<String>) -> Self {
        Self::InvalidLocation { name: name.into() }
    }

    /// Creates an `InvalidTime` error.
    pub fn invalid_time(value: impl Into<String>) -> Self {
        Self::InvalidTime { value: value.into() }
    }

    /// Creates an `InvalidConfiguration` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// True for failures that a later producer in the chain may recover from.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable { .. } | Self::Network(_) | Self::MalformedPayload(_)
        )
    }
}
