//! Per-file organization: raw export → organized artifact.
//!
//! Artifacts are regenerated only when their content would change. The freshly
//! derived artifact is rendered and compared byte-for-byte with what is on
//! disk; an identical artifact is left untouched and still counts as success.

use std::path::{Path, PathBuf};

use assay_core::error::Result;
use tracing::{debug, error, info};

use crate::artifact::{artifact_path, highlights_path, render_artifact, render_highlights, write_artifact};
use crate::reader::read_raw_rows;
use crate::summarizer::organize_rows;

/// Result of organizing one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizeOutcome {
    /// A new or changed artifact was written.
    Written(PathBuf),
    /// The existing artifact already matched; nothing was written.
    Unchanged(PathBuf),
    /// The file could not be organized; the error was logged.
    Failed,
}

impl OrganizeOutcome {
    pub fn artifact_path(&self) -> Option<&Path> {
        match self {
            OrganizeOutcome::Written(p) | OrganizeOutcome::Unchanged(p) => Some(p),
            OrganizeOutcome::Failed => None,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, OrganizeOutcome::Failed)
    }
}

/// Turns raw exports into organized artifacts inside one output directory.
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    output_dir: PathBuf,
}

impl FileOrganizer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Organize `file_path`, never propagating an error.
    ///
    /// Any read, parse or write failure is logged and reported as
    /// [`OrganizeOutcome::Failed`] so a batch can continue with the next file.
    pub fn process(&self, file_path: &Path) -> OrganizeOutcome {
        match self.try_process(file_path) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    "An error occurred while processing '{}': {}",
                    file_path.display(),
                    e
                );
                OrganizeOutcome::Failed
            }
        }
    }

    /// Fallible core of [`FileOrganizer::process`].
    pub fn try_process(&self, file_path: &Path) -> Result<OrganizeOutcome> {
        let rows = read_raw_rows(file_path)?;
        let artifact = organize_rows(&rows);
        let target = artifact_path(&self.output_dir, file_path);

        if target.exists() {
            let fresh = render_artifact(&artifact)?;
            let fresh_highlights = render_highlights(&artifact)?;
            let existing = std::fs::read(&target)?;
            let existing_highlights = std::fs::read(highlights_path(&target)).ok();

            if existing == fresh && existing_highlights.as_deref() == Some(fresh_highlights.as_slice()) {
                info!(
                    "No changes detected in '{}'. Skipping reprocessing.",
                    file_path.display()
                );
                return Ok(OrganizeOutcome::Unchanged(target));
            }
            debug!("Artifact {} is stale; rewriting", target.display());
        }

        write_artifact(&target, &artifact)?;
        info!(
            assays = artifact.tables.len(),
            "Organized '{}' into '{}'",
            file_path.display(),
            target.display()
        );
        Ok(OrganizeOutcome::Written(target))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
