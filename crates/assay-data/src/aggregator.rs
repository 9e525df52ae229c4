//! Merges organized artifacts into one master table per sample group.
//!
//! Each assay table of an artifact is classified into a [`SampleGroup`] by
//! majority vote over its trimmed sample names. Rows are stamped with their
//! source artifact and merge time, deduplicated, filtered and written to
//! `<group>_master_table.csv`. Master tables already on disk seed their group
//! so a run rewrites each file wholesale without losing earlier merges.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assay_core::clock::Clock;
use assay_core::error::{AssayError, Result};
use assay_core::models::{
    AssaySummaryRow, AssayTable, MasterRecord, MasterRow, MasterRowKey, OrganizedArtifact, SampleGroup,
    ORGANIZED_SUFFIX,
};
use assay_core::sample::{determine_sample_group, extract_time_unit, trim_sample_name, GroupingConfig};
use tracing::{debug, error, info, warn};

use crate::artifact::{read_artifact, write_atomic};
use crate::ledger::ProcessedLedger;

/// Column order of a master table.
pub const MASTER_COLUMNS: [&str; 9] = [
    "Sample",
    "Days",
    "Assay",
    "Calc_Concentration_1",
    "Calc_Concentration_2",
    "Avg_Calc_Conc",
    "Std_Dev_Calc_Conc",
    "Data Source",
    "Time Added",
];

/// Sample prefixes of calibrators and standards, never kept in master tables.
const EXCLUDED_PREFIXES: [&str; 2] = ["C0", "S0"];

/// Case-insensitive marker of undiluted controls, never kept in master tables.
const NEAT_MARKER: &str = "neat";

// ── GroupTable ────────────────────────────────────────────────────────────────

/// Rows accumulated for one group, in append order.
#[derive(Debug, Clone, Default)]
pub struct GroupTable {
    rows: Vec<MasterRow>,
    keys: HashSet<MasterRowKey>,
}

impl GroupTable {
    /// Append `row` unless an identical key is already present.
    pub fn push(&mut self, row: MasterRow) -> bool {
        if !self.keys.insert(row.key()) {
            return false;
        }
        self.rows.push(row);
        true
    }

    pub fn rows(&self) -> &[MasterRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ── GroupTables ───────────────────────────────────────────────────────────────

/// Per-group accumulators for one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct GroupTables {
    groups: BTreeMap<SampleGroup, GroupTable>,
    /// Directory whose existing master tables seed newly created groups.
    seed_dir: Option<PathBuf>,
}

impl GroupTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulators that pull in `<dir>/<group>_master_table.csv` on first use.
    pub fn seeded_from(dir: impl Into<PathBuf>) -> Self {
        Self {
            groups: BTreeMap::new(),
            seed_dir: Some(dir.into()),
        }
    }

    /// The table for `group`, created (and seeded) on first use.
    pub fn table_mut(&mut self, group: SampleGroup) -> Result<&mut GroupTable> {
        match self.groups.entry(group) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let table = seed_table(self.seed_dir.as_deref(), group)?;
                Ok(entry.insert(table))
            }
        }
    }

    pub fn get(&self, group: SampleGroup) -> Option<&GroupTable> {
        self.groups.get(&group)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SampleGroup, &GroupTable)> {
        self.groups.iter().map(|(g, t)| (*g, t))
    }
}

fn seed_table(seed_dir: Option<&Path>, group: SampleGroup) -> Result<GroupTable> {
    let mut table = GroupTable::default();
    let Some(dir) = seed_dir else {
        return Ok(table);
    };
    let path = dir.join(group.master_file_name());
    if path.is_file() {
        let existing = read_master_table(&path)?;
        debug!(
            "Seeding group {} with {} rows from {}",
            group,
            existing.len(),
            path.display()
        );
        for row in existing {
            table.push(row);
        }
    }
    Ok(table)
}

// ── AggregationOutcome ────────────────────────────────────────────────────────

/// What one aggregation run did.
#[derive(Debug, Clone, Default)]
pub struct AggregationOutcome {
    /// The input ledger plus every artifact merged by this run.
    pub ledger: ProcessedLedger,
    /// Artifact names merged by this run, in processing order.
    pub merged_artifacts: Vec<String>,
    /// Master table files written by this run.
    pub master_tables: Vec<PathBuf>,
}

// ── MasterAggregator ──────────────────────────────────────────────────────────

pub struct MasterAggregator {
    grouping: GroupingConfig,
    clock: Arc<dyn Clock>,
}

impl MasterAggregator {
    pub fn new(grouping: GroupingConfig, clock: Arc<dyn Clock>) -> Self {
        Self { grouping, clock }
    }

    /// Run [`MasterAggregator::aggregate`], logging any failure.
    ///
    /// Returns `None` when the run stopped early; master tables written before
    /// the failure stay on disk.
    pub fn run(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        ledger: &ProcessedLedger,
    ) -> Option<AggregationOutcome> {
        match self.aggregate(input_dir, output_dir, ledger) {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!(
                    "An error occurred while combining data into master tables: {}",
                    e
                );
                None
            }
        }
    }

    /// Merge every organized artifact in `input_dir` not yet in `ledger`.
    ///
    /// 1. Discover `*_organized_data.csv` files absent from the ledger.
    /// 2. Classify each assay table into a group and stamp its rows.
    /// 3. Append to the group's table, skipping duplicate keys.
    /// 4. Filter each group table and write it to `output_dir`.
    ///
    /// Every discovered artifact enters the returned ledger, whether or not it
    /// contributed rows. An artifact without a `Sample` column is skipped; any
    /// other read failure aborts the run.
    pub fn aggregate(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        ledger: &ProcessedLedger,
    ) -> Result<AggregationOutcome> {
        let artifacts = find_organized_artifacts(input_dir, ledger);
        if artifacts.is_empty() {
            info!(
                "No new organized data files found in '{}'.",
                input_dir.display()
            );
            return Ok(AggregationOutcome {
                ledger: ledger.clone(),
                ..Default::default()
            });
        }

        let names: Vec<String> = artifacts.iter().map(|p| artifact_name(p)).collect();
        info!("Found organized data files: {:?}", names);

        let mut tables = GroupTables::seeded_from(output_dir);
        for (path, name) in artifacts.iter().zip(&names) {
            debug!("Processing file: {}", path.display());
            let artifact = match read_artifact(path) {
                Ok(artifact) => artifact,
                Err(AssayError::MissingColumn { column, .. }) => {
                    warn!("'{}' has no {} column; recording it unmerged", name, column);
                    continue;
                }
                Err(e) => return Err(AssayError::Aggregation(format!("{}: {}", name, e))),
            };
            let added = self.merge_artifact(name, &artifact, &mut tables)?;
            debug!("Merged {} rows from {}", added, name);
        }

        std::fs::create_dir_all(output_dir)?;
        let mut written = Vec::new();
        for (group, table) in tables.iter() {
            if table.is_empty() {
                continue;
            }
            let records = finalize_group(group, table.rows());
            let path = output_dir.join(group.master_file_name());
            write_master_table(&path, &records)?;
            info!(
                rows = records.len(),
                "Master table '{}' updated at '{}'",
                group.sheet_name(),
                path.display()
            );
            written.push(path);
        }

        Ok(AggregationOutcome {
            ledger: ledger.with_processed(names.iter().cloned()),
            merged_artifacts: names,
            master_tables: written,
        })
    }

    /// Classify and append every assay table of one artifact.
    ///
    /// Returns the number of rows added.
    pub fn merge_artifact(
        &self,
        source: &str,
        artifact: &OrganizedArtifact,
        tables: &mut GroupTables,
    ) -> Result<usize> {
        let time_added = self.clock.timestamp();
        let mut added = 0;

        for table in &artifact.tables {
            let Some((group, rows)) = classify_table(table, &self.grouping) else {
                debug!(
                    "No sample group for '{}' sheet '{}'; skipping",
                    source, table.assay
                );
                continue;
            };

            let target = tables.table_mut(group)?;
            let mut skipped = 0;
            for (summary, days) in rows {
                let row = MasterRow {
                    summary,
                    days,
                    data_source: source.to_string(),
                    time_added: time_added.clone(),
                };
                if target.push(row) {
                    added += 1;
                } else {
                    skipped += 1;
                }
            }
            if skipped > 0 {
                info!(
                    "Skipped {} rows of '{}' sheet '{}' already in group {}",
                    skipped, source, table.assay, group
                );
            }
        }

        Ok(added)
    }
}

// ── Classification and post-processing ───────────────────────────────────────

/// Derive days from the original sample names, trim the names, and classify
/// the table by majority vote over the trimmed names.
///
/// Returns `None` when no row has a qualifying numeric prefix.
pub fn classify_table(
    table: &AssayTable,
    grouping: &GroupingConfig,
) -> Option<(SampleGroup, Vec<(AssaySummaryRow, Option<i64>)>)> {
    let rows: Vec<_> = table
        .rows
        .iter()
        .map(|row| {
            let days = extract_time_unit(&row.sample);
            let mut trimmed = row.clone();
            trimmed.sample = trim_sample_name(&row.sample);
            (trimmed, days)
        })
        .collect();

    let group = determine_sample_group(rows.iter().map(|(r, _)| r.sample.as_str()), grouping)?;
    Some((group, rows))
}

/// `true` when a trimmed sample belongs in `group`'s master table.
pub fn keeps_sample(group: SampleGroup, sample: &str) -> bool {
    !EXCLUDED_PREFIXES.iter().any(|p| sample.starts_with(p))
        && !sample.to_lowercase().contains(NEAT_MARKER)
        && sample.starts_with(&group.to_string())
}

/// Filter a group's rows and convert them to persisted records: drops
/// calibrators, standards and neat controls, drops rows whose sample does not
/// start with the group id, removes the recovery columns and zero-fills gaps.
pub fn finalize_group(group: SampleGroup, rows: &[MasterRow]) -> Vec<MasterRecord> {
    rows.iter()
        .filter(|row| keeps_sample(group, &row.summary.sample))
        .cloned()
        .map(MasterRow::into_record)
        .collect()
}

// ── Master table I/O ──────────────────────────────────────────────────────────

pub fn write_master_table(path: &Path, records: &[MasterRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(MASTER_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AssayError::Io(e.into_error()))?;
    write_atomic(path, &bytes)
}

pub fn read_master_table(path: &Path) -> Result<Vec<MasterRow>> {
    let file = std::fs::File::open(path).map_err(|source| AssayError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let mut rows = Vec::new();
    for record in reader.deserialize::<MasterRecord>() {
        rows.push(MasterRow::from(record?));
    }
    Ok(rows)
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Organized artifacts directly inside `dir` that the ledger has not seen,
/// sorted by path.
pub fn find_organized_artifacts(dir: &Path, ledger: &ProcessedLedger) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            let name = artifact_name(path);
            name.ends_with(ORGANIZED_SUFFIX) && !ledger.contains(&name)
        })
        .collect();
    files.sort();
    files
}

fn artifact_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assay_core::clock::FixedClock;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use crate::artifact::write_artifact;

    fn clock() -> Arc<dyn Clock> {
        let at = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        Arc::new(FixedClock(at))
    }

    fn aggregator() -> MasterAggregator {
        MasterAggregator::new(GroupingConfig::default(), clock())
    }

    fn summary(sample: &str, assay: &str, avg: Option<f64>) -> AssaySummaryRow {
        AssaySummaryRow {
            sample: sample.to_string(),
            assay: assay.to_string(),
            calc_concentration_1: avg,
            calc_concentration_2: None,
            avg_calc_conc: avg,
            std_dev_calc_conc: None,
            recovery_1: Some(100.0),
            recovery_2: None,
            avg_recovery: Some(100.0),
            std_dev_recovery: None,
        }
    }

    fn artifact(assay: &str, samples: &[&str]) -> OrganizedArtifact {
        OrganizedArtifact {
            tables: vec![AssayTable {
                assay: assay.to_string(),
                rows: samples.iter().map(|s| summary(s, assay, Some(1.0))).collect(),
                highlights: vec![],
            }],
        }
    }

    fn stamped(sample: &str, days: Option<i64>, source: &str) -> MasterRow {
        MasterRow {
            summary: summary(sample, "IL-6", Some(2.0)),
            days,
            data_source: source.to_string(),
            time_added: "2024-02-01 12:30:00".to_string(),
        }
    }

    // ── classify_table ────────────────────────────────────────────────────────

    #[test]
    fn test_classify_table_days_from_untrimmed_name() {
        let table = &artifact("IL-6", &["101d5", "101w-1", "101 m2 control"]).tables[0];
        let (group, rows) = classify_table(table, &GroupingConfig::default()).unwrap();

        assert_eq!(group, SampleGroup(101));
        let got: Vec<(&str, Option<i64>)> =
            rows.iter().map(|(r, d)| (r.sample.as_str(), *d)).collect();
        assert_eq!(
            got,
            vec![("101", Some(5)), ("101", Some(-7)), ("101 control", Some(60))]
        );
    }

    #[test]
    fn test_classify_table_without_numeric_prefix() {
        let table = &artifact("IL-6", &["S01", "C0-1", "neat"]).tables[0];
        assert!(classify_table(table, &GroupingConfig::default()).is_none());
    }

    // ── GroupTable dedup ──────────────────────────────────────────────────────

    #[test]
    fn test_group_table_rejects_duplicate_key() {
        let mut table = GroupTable::default();
        assert!(table.push(stamped("101", Some(5), "a")));
        assert!(!table.push(stamped("101", Some(5), "a")));
        assert!(table.push(stamped("101", Some(-7), "a")));
        assert!(table.push(stamped("101", Some(5), "b")));
        assert_eq!(table.rows().len(), 3);

        // Undated and day-zero rows share a key; the first one is kept.
        assert!(table.push(stamped("101", None, "a")));
        assert!(!table.push(stamped("101", Some(0), "a")));
        assert_eq!(table.rows().len(), 4);
        assert_eq!(table.rows()[3].days, None);
    }

    #[test]
    fn test_merge_same_artifact_twice_adds_nothing() {
        let agg = aggregator();
        let mut tables = GroupTables::new();
        let art = artifact("IL-6", &["101d5", "150d5"]);

        assert_eq!(agg.merge_artifact("a_organized_data.csv", &art, &mut tables).unwrap(), 2);
        assert_eq!(agg.merge_artifact("a_organized_data.csv", &art, &mut tables).unwrap(), 0);

        let rows = tables.get(SampleGroup(101)).unwrap().rows();
        let keys: HashSet<MasterRowKey> = rows.iter().map(MasterRow::key).collect();
        assert_eq!(keys.len(), rows.len());
    }

    #[test]
    fn test_merge_stamps_provenance() {
        let agg = aggregator();
        let mut tables = GroupTables::new();
        agg.merge_artifact("src_organized_data.csv", &artifact("IL-6", &["201"]), &mut tables)
            .unwrap();

        let row = &tables.get(SampleGroup(201)).unwrap().rows()[0];
        assert_eq!(row.data_source, "src_organized_data.csv");
        assert_eq!(row.time_added, "2024-02-01 12:30:00");
        assert_eq!(row.days, None);
    }

    #[test]
    fn test_merge_majority_group_for_mixed_sheet() {
        let agg = aggregator();
        let mut tables = GroupTables::new();
        agg.merge_artifact("a", &artifact("IL-6", &["201 d1", "201 d2", "101 d1"]), &mut tables)
            .unwrap();

        assert!(tables.get(SampleGroup(101)).is_none());
        let rows = tables.get(SampleGroup(201)).unwrap().rows();
        assert_eq!(rows.len(), 3);

        // The stray 101 row is dropped by the prefix restriction.
        let records = finalize_group(SampleGroup(201), rows);
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.sample == "201"));
    }

    // ── finalize_group ────────────────────────────────────────────────────────

    #[test]
    fn test_keeps_sample_filters() {
        let g = SampleGroup(101);
        assert!(keeps_sample(g, "101"));
        assert!(keeps_sample(g, "101 plasma"));
        assert!(!keeps_sample(g, "C0-1"));
        assert!(!keeps_sample(g, "S01"));
        assert!(!keeps_sample(g, "101 NEAT"));
        assert!(!keeps_sample(g, "101 neat"));
        assert!(!keeps_sample(g, "201"));
    }

    #[test]
    fn test_finalize_group_zero_fills_and_drops_recovery() {
        let rows = vec![stamped("101", None, "a"), stamped("101 Neat", Some(1), "a")];
        let records = finalize_group(SampleGroup(101), &rows);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].days, 0);
        assert_eq!(records[0].calc_concentration_2, 0.0);
        assert_eq!(records[0].std_dev_calc_conc, 0.0);
        assert_eq!(records[0].avg_calc_conc, 2.0);
    }

    // ── Discovery ─────────────────────────────────────────────────────────────

    #[test]
    fn test_find_organized_artifacts_skips_ledger_entries() {
        let tmp = TempDir::new().unwrap();
        for name in [
            "a_organized_data.csv",
            "b_organized_data.csv",
            "b_organized_data.csv.highlights.json",
            "raw.csv",
        ] {
            std::fs::write(tmp.path().join(name), "").unwrap();
        }
        let ledger = ProcessedLedger::new().with_processed(["a_organized_data.csv"]);

        let found = find_organized_artifacts(tmp.path(), &ledger);
        assert_eq!(found, vec![tmp.path().join("b_organized_data.csv")]);
    }

    // ── aggregate ─────────────────────────────────────────────────────────────

    fn write_org(dir: &Path, name: &str, art: &OrganizedArtifact) {
        write_artifact(&dir.join(name), art).unwrap();
    }

    #[test]
    fn test_aggregate_end_to_end_two_groups() {
        let tmp = TempDir::new().unwrap();
        let org = tmp.path().join("organized");
        let master = tmp.path().join("master");
        write_org(&org, "p1_organized_data.csv", &artifact("IL-6", &["101d5", "101w-1"]));
        write_org(&org, "p2_organized_data.csv", &artifact("IL-6", &["201d5"]));

        let outcome = aggregator()
            .aggregate(&org, &master, &ProcessedLedger::new())
            .unwrap();

        assert_eq!(
            outcome.merged_artifacts,
            vec!["p1_organized_data.csv", "p2_organized_data.csv"]
        );
        assert!(outcome.ledger.contains("p1_organized_data.csv"));
        assert!(outcome.ledger.contains("p2_organized_data.csv"));
        assert_eq!(
            outcome.master_tables,
            vec![
                master.join("101_master_table.csv"),
                master.join("201_master_table.csv")
            ]
        );

        let g101 = read_master_table(&master.join("101_master_table.csv")).unwrap();
        let got: Vec<(&str, Option<i64>)> = g101
            .iter()
            .map(|r| (r.summary.sample.as_str(), r.days))
            .collect();
        assert_eq!(got, vec![("101", Some(5)), ("101", Some(-7))]);

        let g201 = read_master_table(&master.join("201_master_table.csv")).unwrap();
        assert_eq!(g201.len(), 1);
        assert_eq!(g201[0].summary.sample, "201");
        assert_eq!(g201[0].days, Some(5));
        assert_eq!(g201[0].data_source, "p2_organized_data.csv");
    }

    #[test]
    fn test_aggregate_master_table_header() {
        let tmp = TempDir::new().unwrap();
        write_org(tmp.path(), "p_organized_data.csv", &artifact("IL-6", &["101"]));
        let master = tmp.path().join("m");

        aggregator()
            .aggregate(tmp.path(), &master, &ProcessedLedger::new())
            .unwrap();

        let text = std::fs::read_to_string(master.join("101_master_table.csv")).unwrap();
        assert_eq!(text.lines().next().unwrap(), MASTER_COLUMNS.join(","));
        assert!(!text.contains("Recovery"));
    }

    #[test]
    fn test_aggregate_no_new_files_is_noop() {
        let tmp = TempDir::new().unwrap();
        let master = tmp.path().join("master");
        write_org(tmp.path(), "p_organized_data.csv", &artifact("IL-6", &["101"]));
        let ledger = ProcessedLedger::new().with_processed(["p_organized_data.csv"]);

        let outcome = aggregator().aggregate(tmp.path(), &master, &ledger).unwrap();
        assert!(outcome.merged_artifacts.is_empty());
        assert!(outcome.master_tables.is_empty());
        assert_eq!(outcome.ledger, ledger);
        assert!(!master.exists());
    }

    #[test]
    fn test_aggregate_marks_artifact_without_group_processed() {
        let tmp = TempDir::new().unwrap();
        write_org(tmp.path(), "std_organized_data.csv", &artifact("IL-6", &["S01", "C0-1"]));

        let outcome = aggregator()
            .aggregate(tmp.path(), &tmp.path().join("m"), &ProcessedLedger::new())
            .unwrap();
        assert!(outcome.ledger.contains("std_organized_data.csv"));
        assert!(outcome.master_tables.is_empty());
    }

    #[test]
    fn test_aggregate_filters_controls() {
        let tmp = TempDir::new().unwrap();
        write_org(
            tmp.path(),
            "p_organized_data.csv",
            &artifact("IL-6", &["101 d1", "101 NEAT", "101 neat d2", "C0-1", "S01"]),
        );
        let master = tmp.path().join("m");

        aggregator()
            .aggregate(tmp.path(), &master, &ProcessedLedger::new())
            .unwrap();

        let rows = read_master_table(&master.join("101_master_table.csv")).unwrap();
        let samples: Vec<&str> = rows.iter().map(|r| r.summary.sample.as_str()).collect();
        assert_eq!(samples, vec!["101"]);
    }

    #[test]
    fn test_aggregate_second_run_keeps_earlier_rows() {
        let tmp = TempDir::new().unwrap();
        let org = tmp.path().join("organized");
        let master = tmp.path().join("master");
        let agg = aggregator();

        write_org(&org, "p1_organized_data.csv", &artifact("IL-6", &["101d5"]));
        let first = agg.aggregate(&org, &master, &ProcessedLedger::new()).unwrap();

        write_org(&org, "p2_organized_data.csv", &artifact("IL-6", &["101d7"]));
        let second = agg.aggregate(&org, &master, &first.ledger).unwrap();
        assert_eq!(second.merged_artifacts, vec!["p2_organized_data.csv"]);

        let rows = read_master_table(&master.join("101_master_table.csv")).unwrap();
        let got: Vec<(&str, Option<i64>)> = rows
            .iter()
            .map(|r| (r.data_source.as_str(), r.days))
            .collect();
        assert_eq!(
            got,
            vec![("p1_organized_data.csv", Some(5)), ("p2_organized_data.csv", Some(7))]
        );

        // Replaying with a lost ledger does not duplicate seeded rows.
        agg.aggregate(&org, &master, &ProcessedLedger::new()).unwrap();
        let replayed = read_master_table(&master.join("101_master_table.csv")).unwrap();
        assert_eq!(replayed.len(), 2);
    }

    #[test]
    fn test_aggregate_skips_artifact_without_sample_column() {
        let tmp = TempDir::new().unwrap();
        let master = tmp.path().join("m");
        write_org(tmp.path(), "good_organized_data.csv", &artifact("IL-6", &["101d5"]));
        std::fs::write(
            tmp.path().join("nosample_organized_data.csv"),
            "Assay,Avg_Calc_Conc\nIL-6,1\n",
        )
        .unwrap();

        let outcome = aggregator()
            .aggregate(tmp.path(), &master, &ProcessedLedger::new())
            .unwrap();

        assert_eq!(
            outcome.merged_artifacts,
            vec!["good_organized_data.csv", "nosample_organized_data.csv"]
        );
        assert!(outcome.ledger.contains("nosample_organized_data.csv"));
        assert!(outcome.ledger.contains("good_organized_data.csv"));
        assert_eq!(outcome.master_tables, vec![master.join("101_master_table.csv")]);

        let rows = read_master_table(&master.join("101_master_table.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].days, Some(5));
    }

    #[test]
    fn test_run_logs_and_returns_none_on_bad_artifact() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("bad_organized_data.csv"),
            "Sample,Assay,Avg_Calc_Conc\n101,IL-6,1,extra\n",
        )
        .unwrap();

        let agg = aggregator();
        let err = agg
            .aggregate(tmp.path(), &tmp.path().join("m"), &ProcessedLedger::new())
            .unwrap_err();
        assert!(matches!(err, AssayError::Aggregation(_)));
        assert!(agg
            .run(tmp.path(), &tmp.path().join("m"), &ProcessedLedger::new())
            .is_none());
    }
}
