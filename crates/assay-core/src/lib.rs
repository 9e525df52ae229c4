//! Core types for the assay table pipeline.
//!
//! Holds the error taxonomy, the row and table models shared by every stage,
//! sample-name parsing, replicate statistics, the clock capability and the
//! command-line / path-list configuration.

pub mod clock;
pub mod error;
pub mod models;
pub mod sample;
pub mod settings;
pub mod stats;

pub use error::{AssayError, Result};
