//! Error types for tseg-run
//!
//! Every failure is scoped to one patient; the batch runner records it and
//! moves on to the next patient.

use crate::models::ResolveError;
use crate::services::{PredictorError, ScanError, StageError};
use thiserror::Error;

/// Per-patient failure
#[derive(Debug, Error)]
pub enum PatientError {
    /// Patient directory could not be scanned
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Available sequences do not map to a model
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Inputs could not be staged
    #[error("Staging failed: {0}")]
    Stage(#[from] StageError),

    /// External predictor failed
    #[error(transparent)]
    Predictor(#[from] PredictorError),
}

impl PatientError {
    /// Stable machine-readable error kind for logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            PatientError::Scan(ScanError::PatientNotFound(_)) => "patient_not_found",
            PatientError::Scan(ScanError::InvalidPatientId(_)) => "invalid_patient_id",
            PatientError::Scan(_) => "scan_failed",
            PatientError::Resolve(ResolveError::NoImaging) => "no_imaging",
            PatientError::Resolve(ResolveError::UnsupportedCombination { .. }) => {
                "unsupported_combination"
            }
            PatientError::Resolve(ResolveError::DuplicateSequence { .. }) => "duplicate_sequence",
            PatientError::Stage(_) => "staging_failed",
            PatientError::Predictor(PredictorError::BinaryNotFound(_)) => "predictor_not_found",
            PatientError::Predictor(PredictorError::Launch(_)) => "predictor_launch_failed",
            PatientError::Predictor(PredictorError::InferenceFailed { .. }) => "inference_failed",
        }
    }
}
