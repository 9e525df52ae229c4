use clap::Parser;
use std::path::{Path, PathBuf};

use crate::error::{AssayError, Result};
use crate::sample::GroupingConfig;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Organize assay exports into per-assay tables and merge them into master tables
#[derive(Parser, Debug, Clone)]
#[command(
    name = "assay-tables",
    about = "Organize assay exports into per-assay tables and merge them into master tables",
    version
)]
pub struct Settings {
    /// Which stages to run
    #[arg(long, default_value = "all", value_parser = ["organize", "aggregate", "all"])]
    pub mode: String,

    /// Path-list file with `input address:` / `output address ...:` entries
    #[arg(long)]
    pub paths_file: Option<PathBuf>,

    /// Directory holding raw assay exports
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Directory receiving organized per-file artifacts
    #[arg(long)]
    pub organized_dir: Option<PathBuf>,

    /// Directory receiving master tables
    #[arg(long)]
    pub master_dir: Option<PathBuf>,

    /// Only organize these input files (repeatable); all files when omitted
    #[arg(long = "file")]
    pub files: Vec<String>,

    /// Processing tracker CSV
    #[arg(long)]
    pub tracker_file: Option<PathBuf>,

    /// Ledger of organized artifacts already merged into master tables
    #[arg(long)]
    pub ledger_file: Option<PathBuf>,

    /// Lowest sample group id
    #[arg(long, default_value = "101")]
    pub base_id: u64,

    /// Width of one sample group bucket
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u64).range(1..))]
    pub increment: u64,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

/// Fully resolved locations for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub input_dir: PathBuf,
    pub organized_dir: PathBuf,
    pub master_dir: PathBuf,
    pub tracker_file: PathBuf,
    pub ledger_file: PathBuf,
}

impl Settings {
    /// Parse the process arguments and apply `--debug`.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    pub fn grouping(&self) -> GroupingConfig {
        GroupingConfig {
            base_id: self.base_id,
            increment: self.increment,
        }
    }

    pub fn runs_organize(&self) -> bool {
        matches!(self.mode.as_str(), "organize" | "all")
    }

    pub fn runs_aggregate(&self) -> bool {
        matches!(self.mode.as_str(), "aggregate" | "all")
    }

    /// Merge CLI directories over the path-list file.
    ///
    /// An explicit `--paths-file` must exist; otherwise `default_paths_file`
    /// is read when present. CLI values always win.
    pub fn resolve_paths(&self, default_paths_file: Option<&Path>) -> Result<ResolvedPaths> {
        let list = match (&self.paths_file, default_paths_file) {
            (Some(explicit), _) => PathList::load_from(explicit)?,
            (None, Some(fallback)) if fallback.is_file() => PathList::load_from(fallback)?,
            _ => PathList::default(),
        };

        let input_dir = pick(self.input_dir.as_ref(), list.input, "input address")?;
        let organized_dir = pick(self.organized_dir.as_ref(), list.organized, "output address organized")?;
        let master_dir = pick(self.master_dir.as_ref(), list.master, "output address master")?;

        let tracker_file = self
            .tracker_file
            .clone()
            .unwrap_or_else(|| organized_dir.join("processing_tracker.csv"));
        let ledger_file = self
            .ledger_file
            .clone()
            .unwrap_or_else(|| master_dir.join("processed_files.json"));

        Ok(ResolvedPaths {
            input_dir,
            organized_dir,
            master_dir,
            tracker_file,
            ledger_file,
        })
    }
}

fn pick(cli: Option<&PathBuf>, listed: Option<PathBuf>, label: &str) -> Result<PathBuf> {
    cli.cloned()
        .or(listed)
        .ok_or_else(|| AssayError::Config(format!("{} is not set", label)))
}

// ── PathList ───────────────────────────────────────────────────────────────────

/// Directory entries read from a path-list file.
///
/// ```text
/// input address: /data/raw
/// output address organized: /data/organized
/// output address master: /data/master
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathList {
    pub input: Option<PathBuf>,
    pub organized: Option<PathBuf>,
    pub master: Option<PathBuf>,
}

impl PathList {
    /// Default location: `~/.assay-tables/paths.txt`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".assay-tables")
            .join("paths.txt")
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| AssayError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    /// Parse `label: value` lines. Labels are case-insensitive; unknown and
    /// blank lines are ignored.
    pub fn parse(content: &str) -> Self {
        let mut list = PathList::default();
        for line in content.lines() {
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = match label.trim().to_lowercase().as_str() {
                "input address" => &mut list.input,
                "output address organized" => &mut list.organized,
                "output address master" => &mut list.master,
                _ => continue,
            };
            *slot = Some(PathBuf::from(value));
        }
        list
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
