//! Common utility functions shared across CLI commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use medialib_core::{InMemoryStore, LibraryConfig, LibrarySnapshot, MediaLibrary};
use tracing::debug;

use crate::exit_codes::{CliError, IO_ERROR, USAGE_ERROR};

/// A library opened from a snapshot file.
pub struct OpenLibrary {
    pub path: PathBuf,
    pub store: Arc<InMemoryStore>,
    pub library: MediaLibrary,
}

impl OpenLibrary {
    /// Write the store's current state back to the snapshot file.
    pub fn save(&self) -> Result<()> {
        save_snapshot(&self.path, &self.store.snapshot())
    }
}

fn require_path(path: Option<PathBuf>) -> Result<PathBuf> {
    path.ok_or_else(|| {
        CliError::new(
            USAGE_ERROR,
            "No library given (use --library or MEDIALIB_LIBRARY)",
        )
        .into()
    })
}

/// Read and parse a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<LibrarySnapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read library: {}", path.display()))?;
    let snapshot = LibrarySnapshot::from_json(&json)
        .with_context(|| format!("Failed to parse library: {}", path.display()))?;
    debug!(
        path = %path.display(),
        assets = snapshot.assets.len(),
        albums = snapshot.albums.len(),
        "Loaded library"
    );
    Ok(snapshot)
}

pub fn save_snapshot(path: &Path, snapshot: &LibrarySnapshot) -> Result<()> {
    let json = snapshot.to_json_pretty()?;
    std::fs::write(path, json).map_err(|e| {
        CliError::new(
            IO_ERROR,
            format!("Failed to write library {}: {e}", path.display()),
        )
    })?;
    debug!(path = %path.display(), "Saved library");
    Ok(())
}

/// Open the library: snapshot file plus environment config, with
/// `--include-hidden` taking precedence over `MEDIALIB_INCLUDE_HIDDEN`.
pub fn open_library(path: Option<PathBuf>, include_hidden: bool) -> Result<OpenLibrary> {
    let path = require_path(path)?;
    let snapshot = load_snapshot(&path)?;

    let mut config = LibraryConfig::from_env();
    config.include_hidden_assets |= include_hidden;

    let store = Arc::new(InMemoryStore::from_snapshot(snapshot));
    let library = MediaLibrary::with_config(store.clone(), config);
    Ok(OpenLibrary {
        path,
        store,
        library,
    })
}

/// Format an optional date as a human-readable UTC string.
pub fn format_date(date: Option<DateTime<Utc>>) -> String {
    match date {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap();
        assert_eq!(format_date(Some(dt)), "2024-01-15 12:30:45 UTC");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_missing_library_is_usage_error() {
        let err = open_library(None, false).err().unwrap();
        let cli = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli.code, USAGE_ERROR);
    }
}
