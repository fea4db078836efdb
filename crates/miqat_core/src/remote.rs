//! Remote Resolver Chain: primary service, then a fallback configured for an
//! alternate convention.

use async_trait::async_trait;
use chrono::NaiveDate;
use miqat_network::{RemoteEndpoint, TimingsClient};
use miqat_types::{Location, MiqatError, PrayerTimeSet, TimeSource};
use tracing::{info, warn};

use crate::producer::PrayerTimeProducer;

#[derive(Debug, Clone)]
pub struct RemoteResolverChain {
    client: TimingsClient,
    primary: RemoteEndpoint,
    fallback: RemoteEndpoint,
}

impl RemoteResolverChain {
    pub fn new(client: TimingsClient, primary: RemoteEndpoint, fallback: RemoteEndpoint) -> Self {
        Self { client, primary, fallback }
    }

    /// Tries the primary then the fallback service.
    ///
    /// Results from the fallback use a different convention and can differ
    /// from the primary by several minutes.
    ///
    /// # Errors
    /// Returns `RemoteUnavailable` carrying both failure reasons.
    pub async fn resolve_remote(&self, location: &Location, date: NaiveDate) -> Result<PrayerTimeSet, MiqatError> {
        let primary_err = match self
            .client
            .fetch(&self.primary, location, date, TimeSource::PrimaryRemote)
            .await
        {
            Ok(set) => return Ok(set),
            Err(e) => e,
        };
        warn!(location = %location.name, %date, error = %primary_err, "primary remote failed, trying fallback");

        match self
            .client
            .fetch(&self.fallback, location, date, TimeSource::FallbackRemote)
            .await
        {
            Ok(set) => {
                info!(location = %location.name, %date, method = self.fallback.method, "resolved from fallback remote");
                Ok(set)
            }
            Err(fallback_err) => {
                warn!(location = %location.name, %date, error = %fallback_err, "fallback remote failed");
                Err(MiqatError::RemoteUnavailable {
                    primary: primary_err.to_string(),
                    fallback: fallback_err.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl PrayerTimeProducer for RemoteResolverChain {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn resolve(&self, location: &Location, date: NaiveDate) -> Result<Option<PrayerTimeSet>, MiqatError> {
        self.resolve_remote(location, date).await.map(Some)
    }
}
