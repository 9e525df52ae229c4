//! Persisted set of organized artifacts already merged into master tables.

use std::collections::BTreeSet;
use std::path::Path;

use assay_core::error::{AssayError, Result};
use serde::{Deserialize, Serialize};

use crate::artifact::write_atomic;

/// Names of organized artifacts that have been merged.
///
/// Values are never mutated in place by the aggregator: a run receives the
/// previous ledger and returns a new one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedLedger {
    #[serde(default)]
    processed_files: BTreeSet<String>,
}

impl ProcessedLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processed_files.contains(name)
    }

    pub fn len(&self) -> usize {
        self.processed_files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed_files.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.processed_files.iter().map(String::as_str)
    }

    /// A copy of this ledger with `names` added.
    pub fn with_processed<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        next.processed_files.extend(names.into_iter().map(Into::into));
        next
    }

    /// Load from `path`; an absent file is an empty ledger.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| AssayError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Atomically write to `path`, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
