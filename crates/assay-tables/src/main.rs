mod bootstrap;

use std::sync::Arc;

use anyhow::Result;
use assay_core::clock::SystemClock;
use assay_core::settings::{PathList, Settings};
use assay_runtime::orchestrator::BatchRunner;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_deref())?;

    tracing::info!("Assay tables v{} starting", env!("CARGO_PKG_VERSION"));

    let paths = settings.resolve_paths(Some(&PathList::default_path()))?;
    tracing::info!(
        "Input: {}, organized: {}, master: {}",
        paths.input_dir.display(),
        paths.organized_dir.display(),
        paths.master_dir.display()
    );

    let runner = BatchRunner::new(
        paths,
        settings.grouping(),
        settings.files.clone(),
        Arc::new(SystemClock),
    );

    let summary = runner.run(settings.runs_organize(), settings.runs_aggregate())?;

    tracing::info!(
        written = summary.written.len(),
        unchanged = summary.unchanged.len(),
        failed = summary.failed.len(),
        merged = summary.merged_artifacts.len(),
        master_tables = summary.master_tables.len(),
        "Run complete"
    );

    if summary.aggregation_failed {
        anyhow::bail!("aggregation stopped early; see log for details");
    }
    Ok(())
}
