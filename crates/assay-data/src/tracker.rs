//! Processing tracker: which raw exports were organized, and when.
//!
//! Stored as a CSV with the header `File Name,File Processed,File Update`,
//! one row per input file. Re-recording a file updates its row in place.

use std::path::Path;

use assay_core::clock::TIMESTAMP_FORMAT;
use assay_core::error::{AssayError, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::write_atomic;

/// One tracked input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEntry {
    #[serde(rename = "File Name")]
    pub file_name: String,
    /// When the file was last organized.
    #[serde(rename = "File Processed")]
    pub file_processed: String,
    /// The input file's modification time at that point.
    #[serde(rename = "File Update")]
    pub file_update: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingTracker {
    entries: Vec<TrackerEntry>,
}

impl ProcessingTracker {
    pub fn entries(&self) -> &[TrackerEntry] {
        &self.entries
    }

    pub fn get(&self, file_name: &str) -> Option<&TrackerEntry> {
        self.entries.iter().find(|e| e.file_name == file_name)
    }

    /// Record `file_name` as processed at `processed`, with the input's
    /// modification time `updated`. Updates the existing row or appends.
    pub fn record(&mut self, file_name: &str, processed: NaiveDateTime, updated: NaiveDateTime) {
        let entry = TrackerEntry {
            file_name: file_name.to_string(),
            file_processed: processed.format(TIMESTAMP_FORMAT).to_string(),
            file_update: updated.format(TIMESTAMP_FORMAT).to_string(),
        };
        match self.entries.iter_mut().find(|e| e.file_name == file_name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// Load from `path`; an absent file is an empty tracker.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let file = std::fs::File::open(path).map_err(|source| AssayError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::Reader::from_reader(file);
        let entries = reader
            .deserialize::<TrackerEntry>()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Loaded {} tracker entries from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(["File Name", "File Processed", "File Update"])?;
        for entry in &self.entries {
            writer.serialize(entry)?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AssayError::Io(e.into_error()))?;
        write_atomic(path, &bytes)
    }
}

/// Local modification time of `path`.
pub fn modified_time(path: &Path) -> Result<NaiveDateTime> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
