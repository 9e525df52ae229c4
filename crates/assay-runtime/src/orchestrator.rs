//! One batch run: organize raw exports, then merge new artifacts.
//!
//! Files are handled one at a time. A file that fails to organize is logged
//! and counted, and the batch moves on. The ledger is only saved after a
//! successful aggregation, so a failed run is retried in full next time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assay_core::clock::Clock;
use assay_core::error::{AssayError, Result};
use assay_core::sample::GroupingConfig;
use assay_core::settings::ResolvedPaths;
use assay_data::aggregator::MasterAggregator;
use assay_data::ledger::ProcessedLedger;
use assay_data::organizer::{FileOrganizer, OrganizeOutcome};
use assay_data::reader::find_raw_files;
use assay_data::tracker::{modified_time, ProcessingTracker};
use tracing::{info, warn};

// ── Public types ──────────────────────────────────────────────────────────────

/// Totals reported at the end of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Artifacts written or rewritten.
    pub written: Vec<PathBuf>,
    /// Artifacts that already matched their input.
    pub unchanged: Vec<PathBuf>,
    /// Input files that could not be organized.
    pub failed: Vec<PathBuf>,
    /// Artifacts merged into master tables by this run.
    pub merged_artifacts: Vec<String>,
    /// Master tables written by this run.
    pub master_tables: Vec<PathBuf>,
    /// Aggregation stopped on an error.
    pub aggregation_failed: bool,
}

/// Fail with a path error unless `path` is an existing directory.
pub fn check_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(AssayError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(AssayError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

// ── BatchRunner ───────────────────────────────────────────────────────────────

pub struct BatchRunner {
    paths: ResolvedPaths,
    grouping: GroupingConfig,
    /// Input file names to organize; empty means every file.
    selection: Vec<String>,
    clock: Arc<dyn Clock>,
}

impl BatchRunner {
    pub fn new(
        paths: ResolvedPaths,
        grouping: GroupingConfig,
        selection: Vec<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            paths,
            grouping,
            selection,
            clock,
        }
    }

    /// Run the organize and/or aggregate stages.
    pub fn run(&self, organize: bool, aggregate: bool) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        if organize {
            self.organize_all(&mut summary)?;
        }
        if aggregate {
            self.aggregate(&mut summary)?;
        }
        Ok(summary)
    }

    /// Organize every selected raw export and record it in the tracker.
    pub fn organize_all(&self, summary: &mut RunSummary) -> Result<()> {
        check_directory(&self.paths.input_dir)?;
        std::fs::create_dir_all(&self.paths.organized_dir)?;

        let files = find_raw_files(&self.paths.input_dir, &self.selection);
        if files.is_empty() {
            info!("No input files to organize in '{}'", self.paths.input_dir.display());
            return Ok(());
        }

        let organizer = FileOrganizer::new(&self.paths.organized_dir);
        let mut tracker = ProcessingTracker::load_from(&self.paths.tracker_file)?;

        for file in &files {
            match organizer.process(file) {
                OrganizeOutcome::Written(path) => summary.written.push(path),
                OrganizeOutcome::Unchanged(path) => summary.unchanged.push(path),
                OrganizeOutcome::Failed => {
                    summary.failed.push(file.clone());
                    continue;
                }
            }
            self.track(&mut tracker, file);
        }

        tracker.save_to(&self.paths.tracker_file)?;
        info!(
            written = summary.written.len(),
            unchanged = summary.unchanged.len(),
            failed = summary.failed.len(),
            "Organized {} input files",
            files.len()
        );
        Ok(())
    }

    /// Merge artifacts not yet in the ledger and persist the new ledger.
    pub fn aggregate(&self, summary: &mut RunSummary) -> Result<()> {
        check_directory(&self.paths.organized_dir)?;

        let ledger = ProcessedLedger::load_from(&self.paths.ledger_file)?;
        let aggregator = MasterAggregator::new(self.grouping, Arc::clone(&self.clock));

        let Some(outcome) =
            aggregator.run(&self.paths.organized_dir, &self.paths.master_dir, &ledger)
        else {
            summary.aggregation_failed = true;
            return Ok(());
        };

        if outcome.ledger != ledger {
            outcome.ledger.save_to(&self.paths.ledger_file)?;
        }
        summary.merged_artifacts = outcome.merged_artifacts;
        summary.master_tables = outcome.master_tables;
        Ok(())
    }

    fn track(&self, tracker: &mut ProcessingTracker, file: &Path) {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let now = self.clock.now();
        let updated = modified_time(file).unwrap_or_else(|e| {
            warn!("Could not read modification time of {}: {}", file.display(), e);
            now
        });
        tracker.record(&name, now, updated);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
