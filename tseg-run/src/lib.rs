//! tseg-run library interface
//!
//! Per-patient orchestration for brain-tumour MRI segmentation: discover the
//! available sequences, pick the matching pre-trained model, stage inputs
//! for the external predictor, run it, and clean up.
//!
//! Exposed as a library so the workflow can be exercised by integration
//! tests with a substitute [`services::Predictor`].

pub mod error;
pub mod models;
pub mod services;
pub mod workflow;

pub use crate::error::PatientError;
pub use crate::models::{InferenceMode, ModelEntry, Sequence, SequenceSet};
pub use crate::workflow::{BatchRunner, BatchSettings, BatchSummary};
