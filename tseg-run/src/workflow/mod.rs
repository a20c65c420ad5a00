//! Batch orchestration and run reporting

pub mod batch;
pub mod report;

pub use batch::{BatchRunner, BatchSettings};
pub use report::{BatchSummary, PatientOutcome, PatientReport};
