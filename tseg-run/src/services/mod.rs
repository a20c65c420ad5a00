//! Service modules for the per-patient workflow

pub mod case_scanner;
pub mod predictor_client;
pub mod stager;
pub mod subject_list;

pub use case_scanner::{CaseScanner, ScanError};
pub use predictor_client::{
    NnUnetPredictor, PredictionOutput, PredictionRequest, Predictor, PredictorError,
};
pub use stager::{StageError, Stager, StagingArea};
pub use subject_list::{load_subjects, parse_subjects};
