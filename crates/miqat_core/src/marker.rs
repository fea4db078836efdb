//! Persistence for the last-synced date.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use miqat_types::MiqatError;
use tracing::warn;

/// Single-value store for the date of the last completed daily sync.
/// `None` means "never synced".
pub trait SyncMarkerStore: fmt::Debug + Send + Sync {
    fn load(&self) -> Result<Option<NaiveDate>, MiqatError>;
    fn save(&self, date: NaiveDate) -> Result<(), MiqatError>;
}

#[derive(Debug, Default)]
pub struct MemoryMarker {
    value: Mutex<Option<NaiveDate>>,
}

impl MemoryMarker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncMarkerStore for MemoryMarker {
    fn load(&self) -> Result<Option<NaiveDate>, MiqatError> {
        Ok(*self.value.lock().unwrap_or_else(|p| p.into_inner()))
    }

    fn save(&self, date: NaiveDate) -> Result<(), MiqatError> {
        *self.value.lock().unwrap_or_else(|p| p.into_inner()) = Some(date);
        Ok(())
    }
}

/// Marker kept as an ISO date in a text file.
#[derive(Debug, Clone)]
pub struct FileMarker {
    path: PathBuf,
}

impl FileMarker {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl SyncMarkerStore for FileMarker {
    fn load(&self) -> Result<Option<NaiveDate>, MiqatError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(MiqatError::storage(format!("{}: {}", self.path.display(), e))),
        };

        match NaiveDate::parse_from_str(content.trim(), "%Y-%m-%d") {
            Ok(date) => Ok(Some(date)),
            Err(_) => {
                warn!(path = %self.path.display(), "unreadable sync marker, treating as never synced");
                Ok(None)
            }
        }
    }

    fn save(&self, date: NaiveDate) -> Result<(), MiqatError> {
        std::fs::write(&self.path, date.format("%Y-%m-%d").to_string())
            .map_err(|e| MiqatError::storage(format!("{}: {}", self.path.display(), e)))
    }
}
