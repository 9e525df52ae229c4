//! Collapses replicate readings into one summary row per sample and assay.

use std::collections::BTreeMap;

use assay_core::models::{
    AssaySummaryRow, AssayTable, HighlightCell, OrganizedArtifact, RawMeasurementRow,
    RecoveryColumn,
};
use assay_core::stats::{mean, relative_std_dev};

/// Lowest acceptable per-replicate `% Recovery`.
pub const RECOVERY_MIN: f64 = 80.0;
/// Highest acceptable per-replicate `% Recovery`.
pub const RECOVERY_MAX: f64 = 120.0;

/// `true` when a recovery value should be highlighted for QC.
pub fn is_recovery_out_of_range(value: f64) -> bool {
    value < RECOVERY_MIN || value > RECOVERY_MAX
}

/// Split raw rows by assay (first-appearance order) and summarize each.
pub fn organize_rows(rows: &[RawMeasurementRow]) -> OrganizedArtifact {
    let mut assays: Vec<&str> = Vec::new();
    for row in rows {
        if !assays.contains(&row.assay.as_str()) {
            assays.push(row.assay.as_str());
        }
    }

    let tables = assays
        .into_iter()
        .map(|assay| {
            let assay_rows: Vec<&RawMeasurementRow> =
                rows.iter().filter(|r| r.assay == assay).collect();
            summarize_assay(assay, &assay_rows)
        })
        .collect();

    OrganizedArtifact { tables }
}

/// Summarize the replicate rows of a single assay.
///
/// Rows are grouped by sample (output sorted by sample name, replicate order
/// preserved inside each group). The first two replicates are reported as-is;
/// averages skip missing values and relative standard deviations use the
/// n − 1 formula.
pub fn summarize_assay(assay: &str, rows: &[&RawMeasurementRow]) -> AssayTable {
    let mut by_sample: BTreeMap<&str, Vec<&RawMeasurementRow>> = BTreeMap::new();
    for &row in rows {
        by_sample.entry(row.sample.as_str()).or_default().push(row);
    }

    let mut table = AssayTable {
        assay: assay.to_string(),
        ..Default::default()
    };

    for (sample, replicates) in by_sample {
        let conc: Vec<Option<f64>> = replicates.iter().map(|r| r.calc_concentration).collect();
        let recovery: Vec<Option<f64>> = replicates.iter().map(|r| r.recovery).collect();

        let summary = AssaySummaryRow {
            sample: sample.to_string(),
            assay: assay.to_string(),
            calc_concentration_1: conc.first().copied().flatten(),
            calc_concentration_2: conc.get(1).copied().flatten(),
            avg_calc_conc: mean(&conc),
            std_dev_calc_conc: relative_std_dev(&conc),
            recovery_1: recovery.first().copied().flatten(),
            recovery_2: recovery.get(1).copied().flatten(),
            avg_recovery: mean(&recovery),
            std_dev_recovery: relative_std_dev(&recovery),
        };

        table.rows.push(summary);
    }

    table.highlights = highlight_cells(&table.rows);
    table
}

/// Out-of-range `Recovery_1` / `Recovery_2` cells, addressed by row index and
/// column name. Missing values are never flagged.
pub fn highlight_cells(rows: &[AssaySummaryRow]) -> Vec<HighlightCell> {
    let mut cells = Vec::new();
    for (row, summary) in rows.iter().enumerate() {
        for (column, value) in [
            (RecoveryColumn::Recovery1, summary.recovery_1),
            (RecoveryColumn::Recovery2, summary.recovery_2),
        ] {
            if let Some(value) = value.filter(|v| is_recovery_out_of_range(*v)) {
                cells.push(HighlightCell { row, column, value });
            }
        }
    }
    cells
}

// ── Tests ─────────────────────────────────────────────────────────────────────
