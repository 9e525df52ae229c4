use serde::{Deserialize, Serialize};
use std::fmt;

// ── File naming ───────────────────────────────────────────────────────────────

/// Suffix appended to an input file stem to name its organized artifact.
pub const ORGANIZED_SUFFIX: &str = "_organized_data.csv";

/// Suffix appended to a group id to name its master table.
pub const MASTER_SUFFIX: &str = "_master_table.csv";

// ── Raw input ─────────────────────────────────────────────────────────────────

/// One replicate reading from an assay export.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeasurementRow {
    pub sample: String,
    pub assay: String,
    /// `Calc. Concentration`; `None` when the cell was empty or non-numeric.
    pub calc_concentration: Option<f64>,
    /// `% Recovery`; `None` when the cell was empty or non-numeric.
    pub recovery: Option<f64>,
}

// ── Organized output ──────────────────────────────────────────────────────────

/// Replicate summary for one sample within one assay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssaySummaryRow {
    #[serde(rename = "Sample")]
    pub sample: String,
    #[serde(rename = "Assay")]
    pub assay: String,
    #[serde(rename = "Calc_Concentration_1")]
    pub calc_concentration_1: Option<f64>,
    #[serde(rename = "Calc_Concentration_2")]
    pub calc_concentration_2: Option<f64>,
    #[serde(rename = "Avg_Calc_Conc")]
    pub avg_calc_conc: Option<f64>,
    #[serde(rename = "Std_Dev_Calc_Conc")]
    pub std_dev_calc_conc: Option<f64>,
    #[serde(rename = "Recovery_1")]
    pub recovery_1: Option<f64>,
    #[serde(rename = "Recovery_2")]
    pub recovery_2: Option<f64>,
    #[serde(rename = "Avg_Recovery")]
    pub avg_recovery: Option<f64>,
    #[serde(rename = "Std_Dev_Recovery")]
    pub std_dev_recovery: Option<f64>,
}

/// The two per-replicate recovery columns subject to QC highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecoveryColumn {
    #[serde(rename = "Recovery_1")]
    Recovery1,
    #[serde(rename = "Recovery_2")]
    Recovery2,
}

impl RecoveryColumn {
    pub fn name(self) -> &'static str {
        match self {
            RecoveryColumn::Recovery1 => "Recovery_1",
            RecoveryColumn::Recovery2 => "Recovery_2",
        }
    }
}

/// A summary cell whose recovery value falls outside the accepted range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightCell {
    /// Index into [`AssayTable::rows`].
    pub row: usize,
    pub column: RecoveryColumn,
    pub value: f64,
}

/// Summary rows for a single assay, one per distinct sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AssayTable {
    pub assay: String,
    pub rows: Vec<AssaySummaryRow>,
    /// Out-of-range recovery cells for the rendering layer.
    pub highlights: Vec<HighlightCell>,
}

/// Everything derived from one input file: one table per assay, in the order
/// the assays first appear in the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrganizedArtifact {
    pub tables: Vec<AssayTable>,
}

impl OrganizedArtifact {
    /// Look up the table for `assay`.
    pub fn table(&self, assay: &str) -> Option<&AssayTable> {
        self.tables.iter().find(|t| t.assay == assay)
    }

    /// Assay names in artifact order.
    pub fn assays(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.assay.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.rows.is_empty())
    }
}

// ── Sample groups ─────────────────────────────────────────────────────────────

/// Bucketed numeric sample-id prefix, e.g. `101`, `201`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleGroup(pub u64);

impl SampleGroup {
    /// File name of this group's master table.
    pub fn master_file_name(&self) -> String {
        format!("{}{}", self.0, MASTER_SUFFIX)
    }

    /// Logical sheet name of this group's master table.
    pub fn sheet_name(&self) -> String {
        format!("{}_master", self.0)
    }
}

impl fmt::Display for SampleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Master tables ─────────────────────────────────────────────────────────────

/// Identity of a master row, see [`MasterRow::key`].
pub type MasterRowKey = (String, String, String, i64);

/// A summary row classified into a group and stamped with its provenance,
/// before the master-table post-processing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MasterRow {
    pub summary: AssaySummaryRow,
    /// Signed time offset parsed from the untrimmed sample name.
    pub days: Option<i64>,
    /// Name of the organized artifact the row came from.
    pub data_source: String,
    pub time_added: String,
}

impl MasterRow {
    /// Dedup key: `(Data Source, Assay, Sample, Days)`.
    ///
    /// The sample is the trimmed display name, which no longer carries the
    /// time point, so the day offset completes the identity. A missing offset
    /// keys as `0` because master tables persist it as `0`: an undated `101`
    /// and a `101 d0` from the same source and assay are the same row, and
    /// the first one merged wins.
    pub fn key(&self) -> MasterRowKey {
        (
            self.data_source.clone(),
            self.summary.assay.clone(),
            self.summary.sample.clone(),
            self.days.unwrap_or(0),
        )
    }

    /// Drop the recovery columns and fill every missing value with zero.
    pub fn into_record(self) -> MasterRecord {
        let s = self.summary;
        MasterRecord {
            sample: s.sample,
            days: self.days.unwrap_or(0),
            assay: s.assay,
            calc_concentration_1: s.calc_concentration_1.unwrap_or(0.0),
            calc_concentration_2: s.calc_concentration_2.unwrap_or(0.0),
            avg_calc_conc: s.avg_calc_conc.unwrap_or(0.0),
            std_dev_calc_conc: s.std_dev_calc_conc.unwrap_or(0.0),
            data_source: self.data_source,
            time_added: self.time_added,
        }
    }
}

/// One persisted master-table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    #[serde(rename = "Sample")]
    pub sample: String,
    #[serde(rename = "Days")]
    pub days: i64,
    #[serde(rename = "Assay")]
    pub assay: String,
    #[serde(rename = "Calc_Concentration_1")]
    pub calc_concentration_1: f64,
    #[serde(rename = "Calc_Concentration_2")]
    pub calc_concentration_2: f64,
    #[serde(rename = "Avg_Calc_Conc")]
    pub avg_calc_conc: f64,
    #[serde(rename = "Std_Dev_Calc_Conc")]
    pub std_dev_calc_conc: f64,
    #[serde(rename = "Data Source")]
    pub data_source: String,
    #[serde(rename = "Time Added")]
    pub time_added: String,
}

impl From<MasterRecord> for MasterRow {
    fn from(r: MasterRecord) -> Self {
        MasterRow {
            summary: AssaySummaryRow {
                sample: r.sample,
                assay: r.assay,
                calc_concentration_1: Some(r.calc_concentration_1),
                calc_concentration_2: Some(r.calc_concentration_2),
                avg_calc_conc: Some(r.avg_calc_conc),
                std_dev_calc_conc: Some(r.std_dev_calc_conc),
                recovery_1: None,
                recovery_2: None,
                avg_recovery: None,
                std_dev_recovery: None,
            },
            days: Some(r.days),
            data_source: r.data_source,
            time_added: r.time_added,
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
