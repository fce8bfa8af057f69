//! Per-task resume cursor.
//!
//! After every page the scanner records the offset of the next page and the
//! number of rows already flushed to CSV, so an interrupted scan picks up
//! where it stopped instead of re-reading the whole history.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Scan progress for a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Offset of the first page not yet processed.
    pub next_offset: u64,
    /// Rows in the CSV that belong to processed pages.
    pub rows: usize,
    /// The indexer reported no further pages.
    pub complete: bool,
    /// Unix timestamp (seconds) of the last update.
    pub updated_at: u64,
}

impl Cursor {
    /// Create a cursor stamped with the current time.
    #[must_use]
    pub fn now(next_offset: u64, rows: usize, complete: bool) -> Self {
        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            next_offset,
            rows,
            complete,
            updated_at,
        }
    }

    /// Read a cursor from `path`.
    ///
    /// Returns `None` if the file does not exist (first scan) or contains
    /// invalid JSON (logs a warning and triggers a fresh scan).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read (I/O error).
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        match serde_json::from_str::<Self>(&data) {
            Ok(cursor) => Ok(Some(cursor)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupted cursor, starting fresh");
                Ok(None)
            }
        }
    }

    /// Persist the cursor to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");

        std::fs::write(&tmp, serde_json::to_string_pretty(self)?.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))?;

        Ok(())
    }

    /// Remove the cursor at `path`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}
