use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the assay table pipeline.
#[derive(Error, Debug)]
pub enum AssayError {
    /// A configured directory does not exist.
    #[error("Directory '{0}' does not exist")]
    PathNotFound(PathBuf),

    /// A configured path exists but is not a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),

    /// The input file extension is not one we know how to read.
    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A required column is absent from an input or artifact header.
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { path: PathBuf, column: String },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed or serialized.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Merging organized artifacts into master tables failed.
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the assay crates.
pub type Result<T> = std::result::Result<T, AssayError>;
