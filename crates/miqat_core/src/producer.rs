//! Producer strategies tried in order by the resolver.

use std::fmt;

use async_trait::async_trait;
use chrono::NaiveDate;
use miqat_astronomy::LocalCalculator;
use miqat_types::{Location, MiqatError, PrayerTimeSet};

use crate::overrides::ExactOverrides;

/// One way of producing a [`PrayerTimeSet`].
///
/// `Ok(None)` means the producer does not apply and the next one should run;
/// `Err` means it applied and failed.
#[async_trait]
pub trait PrayerTimeProducer: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, location: &Location, date: NaiveDate) -> Result<Option<PrayerTimeSet>, MiqatError>;
}

#[async_trait]
impl PrayerTimeProducer for ExactOverrides {
    fn name(&self) -> &'static str {
        "exact-override"
    }

    async fn resolve(&self, location: &Location, date: NaiveDate) -> Result<Option<PrayerTimeSet>, MiqatError> {
        Ok(self.lookup_exact(&location.name, date))
    }
}

#[async_trait]
impl PrayerTimeProducer for LocalCalculator {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn resolve(&self, location: &Location, date: NaiveDate) -> Result<Option<PrayerTimeSet>, MiqatError> {
        Ok(Some(self.compute(location, date)))
    }
}
