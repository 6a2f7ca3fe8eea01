//! File-backed rolling memory.
//!
//! The bot's memory is a JSON array of short strings in a single file:
//!
//! ```json
//! [
//!   "player likes diamonds",
//!   "player asked to mine stone"
//! ]
//! ```
//!
//! Every read parses the whole file and every append rewrites it. Memory
//! loss is acceptable; refusing to answer is not. So no public method here
//! returns an error. I/O and parse failures are logged and the store falls
//! back to "empty" or "unchanged". A file that cannot be parsed is renamed to
//! `<path>.corrupt-<unix-millis>` so the next append starts clean.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default cap on stored entries.
pub const DEFAULT_MAX_ENTRIES: usize = 200;

/// Failures inside the store. Always recovered locally.
#[derive(Debug, Error)]
pub enum MemoryIoError {
    /// Reading or writing the backing file failed.
    #[error("memory file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The file holds something other than a JSON array of strings.
    #[error("memory file is corrupt: {0}")]
    Corrupt(String),
}

/// Rolling, capped, file-backed list of memory entries.
///
/// Appends are serialized through an internal lock, so one store can be
/// shared between tasks without losing read-modify-write updates.
#[derive(Debug)]
pub struct MemoryStore {
    path: PathBuf,
    max_entries: usize,
    write_lock: Mutex<()>,
}

impl MemoryStore {
    /// Create a store backed by `path` with the default cap.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, DEFAULT_MAX_ENTRIES)
    }

    /// Create a store backed by `path` keeping at most `max_entries`.
    ///
    /// A cap of zero is treated as one.
    #[must_use]
    pub fn with_capacity(path: impl Into<PathBuf>, max_entries: usize) -> Self {
        Self {
            path: path.into(),
            max_entries: max_entries.max(1),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Maximum number of entries retained.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Load all entries, oldest first.
    ///
    /// Returns an empty list when the file is absent, blank, unreadable, or
    /// not a JSON array of strings. Corrupt files are moved aside.
    #[must_use]
    pub fn load(&self) -> Vec<String> {
        match self.try_load() {
            Ok(entries) => entries,
            Err(MemoryIoError::Corrupt(reason)) => {
                warn!(
                    path = %self.path.display(),
                    %reason,
                    "Memory file corrupt, resetting to empty"
                );
                self.quarantine();
                Vec::new()
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "Failed to read memory file");
                Vec::new()
            }
        }
    }

    /// Append one entry.
    ///
    /// Blank text is ignored. The text is trimmed, pushed to the end, and the
    /// oldest entries are dropped until at most `max_entries` remain. Write
    /// failures are logged and otherwise ignored.
    pub fn append(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let _guard = self.write_lock.lock();
        let start = Instant::now();

        let mut entries = self.load();
        entries.push(text.to_string());
        if entries.len() > self.max_entries {
            let excess = entries.len() - self.max_entries;
            entries.drain(..excess);
        }

        match self.save(&entries) {
            Ok(()) => debug!(
                entries = entries.len(),
                elapsed_us = start.elapsed().as_micros(),
                "Memory saved"
            ),
            Err(err) => warn!(path = %self.path.display(), error = %err, "Failed to save memory"),
        }
    }

    /// All entries joined with newlines; empty when there are none.
    #[must_use]
    pub fn as_joined_string(&self) -> String {
        self.load().join("\n")
    }

    fn try_load(&self) -> Result<Vec<String>, MemoryIoError> {
        // Bytes, so that invalid UTF-8 counts as corruption rather than I/O.
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Memory file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err.into()),
        };

        if raw.trim_ascii().is_empty() {
            return Ok(Vec::new());
        }

        let value: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|e| MemoryIoError::Corrupt(e.to_string()))?;

        // Valid JSON of the wrong shape is treated as empty but left in place.
        let Some(items) = value.as_array() else {
            warn!(path = %self.path.display(), "Memory file is not an array, ignoring it");
            return Ok(Vec::new());
        };
        if items.iter().any(|v| !v.is_string()) {
            warn!(
                path = %self.path.display(),
                "Memory file contains non-string entries, ignoring it"
            );
            return Ok(Vec::new());
        }

        Ok(items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect())
    }

    fn save(&self, entries: &[String]) -> Result<(), MemoryIoError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| MemoryIoError::Corrupt(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn quarantine(&self) {
        let backup = self.quarantine_path();
        match std::fs::rename(&self.path, &backup) {
            Ok(()) => info!(backup = %backup.display(), "Corrupt memory file moved aside"),
            Err(err) => warn!(
                path = %self.path.display(),
                error = %err,
                "Failed to move corrupt memory file aside"
            ),
        }
    }

    fn quarantine_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".corrupt-{}", Utc::now().timestamp_millis()));
        PathBuf::from(name)
    }
}
