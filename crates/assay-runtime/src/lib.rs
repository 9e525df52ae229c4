//! Batch orchestration for the assay table pipeline.
//!
//! Wires the organizer, tracker, aggregator and ledger together for one
//! synchronous run over the configured directories.

pub mod orchestrator;

pub use assay_core as core;
pub use assay_data as data;
