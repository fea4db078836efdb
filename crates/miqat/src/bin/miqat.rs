//! Command-line front end for the prayer-time service.
//!
//! ```sh
//! miqat Lahore
//! miqat Faisalabad --date 2025-03-15
//! miqat Karachi --offline --hanafi
//! miqat --list
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use miqat::{AsrShadow, Prayer, PrayerTimeService, ServiceConfig};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "miqat", version, about = "Daily prayer times for registered cities")]
struct Cli {
    /// Registered location name, e.g. "Lahore".
    location: Option<String>,

    /// Date to resolve (YYYY-MM-DD). Defaults to today on the region clock.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Skip the remote services and calculate locally.
    #[arg(long)]
    offline: bool,

    /// Use the Hanafi Asr convention (shadow factor 2).
    #[arg(long)]
    hanafi: bool,

    /// List registered locations and exit.
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServiceConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => ServiceConfig::default(),
    };
    if cli.offline {
        config = config.remote_enabled(false);
    }
    if cli.hanafi {
        config = config.asr_shadow(AsrShadow::Hanafi);
    }

    debug!(remote = config.remote_enabled, asr = ?config.asr_shadow, locations = config.locations.len(), "configuration loaded");
    let service = PrayerTimeService::from_config(&config)?;

    if cli.list {
        for location in service.registry().iter() {
            println!("{:<12} {:>8.4} {:>8.4}", location.name, location.lat, location.lng);
        }
        return Ok(());
    }

    let Some(name) = cli.location.as_deref() else {
        bail!("a location is required (see --list)");
    };

    let times = match cli.date {
        Some(date) => service.get_prayer_times(name, date).await?,
        None => service.times_for_today(name).await?,
    };

    info!(location = name, date = %times.date, source = %times.source, "prayer times ready");

    let display = times.display();
    println!("{} | {} ({})", name, times.date, times.source);
    for (prayer, time) in times.iter() {
        let twelve = match prayer {
            Prayer::Fajr => &display.fajr,
            Prayer::Dhuhr => &display.dhuhr,
            Prayer::Asr => &display.asr,
            Prayer::Maghrib => &display.maghrib,
            Prayer::Isha => &display.isha,
        };
        println!("  {:<8} {}  {}", prayer.name(), time, twelve);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_location_and_flags() {
        let cli = Cli::try_parse_from(["miqat", "Lahore", "--date", "2025-03-15", "--offline", "--hanafi"]).unwrap();
        assert_eq!(cli.location.as_deref(), Some("Lahore"));
        assert_eq!(cli.date, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert!(cli.offline && cli.hanafi && !cli.list);
    }

    #[test]
    fn test_rejects_malformed_date() {
        assert!(Cli::try_parse_from(["miqat", "Lahore", "--date", "15/03/2025"]).is_err());
    }
}
