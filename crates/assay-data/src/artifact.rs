//! On-disk codec for organized artifacts.
//!
//! An artifact is a single CSV holding every assay's summary table, each assay
//! as one contiguous block of rows. Out-of-range recovery cells are listed in a
//! JSON sidecar next to it so a spreadsheet renderer can colour them.

use std::path::{Path, PathBuf};

use assay_core::error::{AssayError, Result};
use assay_core::models::{AssaySummaryRow, AssayTable, OrganizedArtifact, RecoveryColumn, ORGANIZED_SUFFIX};
use serde::{Deserialize, Serialize};

use crate::summarizer::highlight_cells;

/// Column order of an organized artifact.
pub const SUMMARY_COLUMNS: [&str; 10] = [
    "Sample",
    "Assay",
    "Calc_Concentration_1",
    "Calc_Concentration_2",
    "Avg_Calc_Conc",
    "Std_Dev_Calc_Conc",
    "Recovery_1",
    "Recovery_2",
    "Avg_Recovery",
    "Std_Dev_Recovery",
];

/// One highlighted cell as written to the sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightRecord {
    pub assay: String,
    pub sample: String,
    pub column: RecoveryColumn,
    pub value: f64,
}

// ── Naming ────────────────────────────────────────────────────────────────────

/// `<output_dir>/<input-stem>_organized_data.csv`
pub fn artifact_path(output_dir: &Path, input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    output_dir.join(format!("{}{}", stem, ORGANIZED_SUFFIX))
}

/// Sidecar path: the artifact path with `.highlights.json` appended.
pub fn highlights_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_owned();
    name.push(".highlights.json");
    PathBuf::from(name)
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Serialize the artifact's tables to CSV bytes.
pub fn render_artifact(artifact: &OrganizedArtifact) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(SUMMARY_COLUMNS)?;
    for table in &artifact.tables {
        for row in &table.rows {
            writer.serialize(row)?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| AssayError::Io(e.into_error()))
}

/// Serialize the artifact's highlighted cells to JSON bytes.
pub fn render_highlights(artifact: &OrganizedArtifact) -> Result<Vec<u8>> {
    let records: Vec<HighlightRecord> = artifact
        .tables
        .iter()
        .flat_map(|table| {
            table.highlights.iter().filter_map(|cell| {
                table.rows.get(cell.row).map(|row| HighlightRecord {
                    assay: table.assay.clone(),
                    sample: row.sample.clone(),
                    column: cell.column,
                    value: cell.value,
                })
            })
        })
        .collect();
    Ok(serde_json::to_vec_pretty(&records)?)
}

/// Write the artifact CSV and its highlight sidecar.
///
/// Each file is written to a temp path and renamed into place.
pub fn write_artifact(path: &Path, artifact: &OrganizedArtifact) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_atomic(path, &render_artifact(artifact)?)?;
    write_atomic(&highlights_path(path), &render_highlights(artifact)?)?;
    Ok(())
}

pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Read an artifact back into per-assay tables.
///
/// Rows are regrouped by their `Assay` value in first-appearance order and the
/// highlight cells are recomputed from the recovery values.
pub fn read_artifact(path: &Path) -> Result<OrganizedArtifact> {
    let file = std::fs::File::open(path).map_err(|source| AssayError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == "Sample") {
        return Err(AssayError::MissingColumn {
            path: path.to_path_buf(),
            column: "Sample".to_string(),
        });
    }

    let mut artifact = OrganizedArtifact::default();
    for record in reader.deserialize::<AssaySummaryRow>() {
        let row = record?;
        match artifact.tables.iter_mut().find(|t| t.assay == row.assay) {
            Some(table) => table.rows.push(row),
            None => artifact.tables.push(AssayTable {
                assay: row.assay.clone(),
                rows: vec![row],
                highlights: Vec::new(),
            }),
        }
    }

    for table in &mut artifact.tables {
        table.highlights = highlight_cells(&table.rows);
    }
    Ok(artifact)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
