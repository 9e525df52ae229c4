//! Data layer for the assay table pipeline.
//!
//! Reads raw assay exports, summarizes replicates per assay, writes and
//! re-reads organized artifacts, and merges them into per-group master tables.
//! Also owns the two small persistence files: the processed-artifact ledger
//! and the processing tracker.

pub mod aggregator;
pub mod artifact;
pub mod ledger;
pub mod organizer;
pub mod reader;
pub mod summarizer;
pub mod tracker;

pub use assay_core as core;
