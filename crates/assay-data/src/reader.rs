//! Raw assay export discovery and loading.
//!
//! Exports are CSV files with one replicate per row. Some instrument variants
//! prepend a plate-name line above the header, so the header is located among
//! the first records rather than assumed to be the first line.

use std::path::{Path, PathBuf};

use assay_core::error::{AssayError, Result};
use assay_core::models::{RawMeasurementRow, MASTER_SUFFIX, ORGANIZED_SUFFIX};
use tracing::{debug, warn};

pub const SAMPLE_COLUMN: &str = "Sample";
pub const ASSAY_COLUMN: &str = "Assay";
pub const CONCENTRATION_COLUMN: &str = "Calc. Concentration";
pub const RECOVERY_COLUMN: &str = "% Recovery";

/// Extensions offered for processing. Only `csv` can actually be read.
const CANDIDATE_EXTENSIONS: &[&str] = &["csv", "xlsx"];

/// How many leading records may precede the header row.
const HEADER_SEARCH_ROWS: usize = 2;

// ── Public API ────────────────────────────────────────────────────────────────

/// List raw export files directly inside `dir`, sorted by path.
///
/// Organized artifacts and master tables are never listed. When `selection`
/// is non-empty only files whose name appears in it are returned.
pub fn find_raw_files(dir: &Path, selection: &[String]) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Input directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_raw_candidate(path))
        .collect();

    if !selection.is_empty() {
        for wanted in selection {
            if !files.iter().any(|p| file_name(p) == wanted.as_str()) {
                warn!("Selected file '{}' not found in {}", wanted, dir.display());
            }
        }
        files.retain(|p| selection.iter().any(|s| s.as_str() == file_name(p)));
    }

    files.sort();
    files
}

/// Load every replicate row from a raw export.
///
/// Fails with [`AssayError::UnsupportedFormat`] for anything but `.csv` and
/// with [`AssayError::MissingColumn`] when a required column is absent.
/// Numeric cells that do not parse are kept as missing values.
pub fn read_raw_rows(path: &Path) -> Result<Vec<RawMeasurementRow>> {
    match extension(path).as_deref() {
        Some("csv") => read_csv_rows(path),
        _ => Err(AssayError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Parse a numeric cell, treating blanks, text and non-finite values as missing.
pub fn parse_numeric(cell: &str) -> Option<f64> {
    cell.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_raw_candidate(path: &Path) -> bool {
    let name = file_name(path);
    if name.ends_with(ORGANIZED_SUFFIX) || name.ends_with(MASTER_SUFFIX) {
        return false;
    }
    extension(path)
        .map(|ext| CANDIDATE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Positions of the required columns within a record.
struct ColumnIndex {
    sample: usize,
    assay: usize,
    concentration: usize,
    recovery: usize,
}

impl ColumnIndex {
    fn from_header(header: &csv::StringRecord, path: &Path) -> Result<Self> {
        let find = |name: &str| {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| AssayError::MissingColumn {
                    path: path.to_path_buf(),
                    column: name.to_string(),
                })
        };
        Ok(Self {
            sample: find(SAMPLE_COLUMN)?,
            assay: find(ASSAY_COLUMN)?,
            concentration: find(CONCENTRATION_COLUMN)?,
            recovery: find(RECOVERY_COLUMN)?,
        })
    }
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawMeasurementRow>> {
    let file = std::fs::File::open(path).map_err(|source| AssayError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut records = reader.records();

    let mut header: Option<csv::StringRecord> = None;
    for _ in 0..HEADER_SEARCH_ROWS {
        let Some(record) = records.next() else {
            break;
        };
        let record = record?;
        if record.iter().any(|cell| cell == SAMPLE_COLUMN) {
            header = Some(record);
            break;
        }
    }
    let header = header.ok_or_else(|| AssayError::MissingColumn {
        path: path.to_path_buf(),
        column: SAMPLE_COLUMN.to_string(),
    })?;
    let idx = ColumnIndex::from_header(&header, path)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for record in records {
        let record = record?;
        let sample = record.get(idx.sample).unwrap_or("");
        let assay = record.get(idx.assay).unwrap_or("");
        if sample.is_empty() || assay.is_empty() {
            skipped += 1;
            continue;
        }
        rows.push(RawMeasurementRow {
            sample: sample.to_string(),
            assay: assay.to_string(),
            calc_concentration: record.get(idx.concentration).and_then(parse_numeric),
            recovery: record.get(idx.recovery).and_then(parse_numeric),
        });
    }

    debug!(
        "Read {} rows from {} ({} skipped without sample/assay)",
        rows.len(),
        path.display(),
        skipped
    );

    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
