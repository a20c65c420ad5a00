//! Sequential per-patient batch runner
//!
//! For each subject: scan the patient directory, resolve the model for the
//! available sequences, stage the inputs, run the predictor, and clean up.
//! Patients are processed one at a time and a failure never aborts the
//! batch.

use crate::error::PatientError;
use crate::models::{resolve, InferenceMode, UnrecognisedPolicy};
use crate::services::{CaseScanner, PredictionRequest, Predictor, Stager, StagingArea};
use crate::workflow::report::{BatchSummary, PatientOutcome, PatientReport};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tseg_common::config::DEFAULT_FOLD;
use tseg_common::human_time::{format_elapsed, format_minutes};

/// Lines of predictor stdout echoed at debug level
const PREDICTOR_LOG_LINES: usize = 10;

/// Runner settings resolved from CLI and config
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Directory holding one sub-directory per patient
    pub patient_root: PathBuf,
    pub mode: InferenceMode,
    /// Fold selector passed to the predictor
    pub fold: String,
    /// Keep `segmentation/tmpdir` after inference
    pub keep_staging: bool,
    pub unrecognised: UnrecognisedPolicy,
    /// Resolve and log commands without touching the filesystem
    pub dry_run: bool,
}

impl BatchSettings {
    pub fn new(patient_root: impl Into<PathBuf>, mode: InferenceMode) -> Self {
        Self {
            patient_root: patient_root.into(),
            mode,
            fold: DEFAULT_FOLD.to_string(),
            keep_staging: false,
            unrecognised: UnrecognisedPolicy::Strict,
            dry_run: false,
        }
    }
}

/// Batch runner
pub struct BatchRunner<P: Predictor> {
    settings: BatchSettings,
    scanner: CaseScanner,
    stager: Stager,
    predictor: P,
}

impl<P: Predictor> BatchRunner<P> {
    pub fn new(settings: BatchSettings, predictor: P) -> Self {
        Self {
            settings,
            scanner: CaseScanner::new(),
            stager: Stager::new(),
            predictor,
        }
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    /// Process every subject in order
    ///
    /// Cancellation is checked between patients; an in-flight predictor run
    /// is always awaited.
    pub async fn run(&self, subjects: &[String], cancel: &CancellationToken) -> BatchSummary {
        let batch_start = Instant::now();
        let mut summary = BatchSummary::new(self.settings.mode, subjects.len());

        info!(
            run_id = %summary.run_id,
            patients = subjects.len(),
            mode = %self.settings.mode,
            predictor = self.predictor.name(),
            "Number of unique patients: {}",
            subjects.len()
        );

        for (index, patient_id) in subjects.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(
                    processed = index,
                    remaining = subjects.len() - index,
                    "Batch interrupted, stopping before next patient"
                );
                summary.interrupted = true;
                break;
            }

            info!("Patient {}/{}", index + 1, subjects.len());
            info!(patient_id = %patient_id, "Patient ID: {}", patient_id);

            let start = Instant::now();
            let outcome = match self.process_patient(patient_id).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(
                        patient_id = %patient_id,
                        kind = e.kind(),
                        error = %e,
                        "Patient failed"
                    );
                    PatientOutcome::Failed {
                        kind: e.kind().to_string(),
                        message: e.to_string(),
                    }
                }
            };
            let elapsed = start.elapsed();

            info!(
                patient_id = %patient_id,
                "Time taken on this patient_id: {} mins",
                format_minutes(elapsed)
            );

            summary.patients.push(PatientReport {
                patient_id: patient_id.clone(),
                outcome,
                elapsed_seconds: elapsed.as_secs_f64(),
            });
        }

        let elapsed = batch_start.elapsed();
        summary.elapsed_seconds = elapsed.as_secs_f64();

        info!(
            run_id = %summary.run_id,
            completed = summary.completed(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            interrupted = summary.interrupted,
            "Batch finished in {}",
            format_elapsed(elapsed)
        );

        summary
    }

    /// Run the whole pipeline for one patient
    pub async fn process_patient(&self, patient_id: &str) -> Result<PatientOutcome, PatientError> {
        let case = self.scanner.scan(&self.settings.patient_root, patient_id)?;

        if !case.has_imaging() {
            warn!(
                patient_id = %patient_id,
                "**Warning** No usable imaging found, moving to next accession"
            );
            return Ok(PatientOutcome::Skipped {
                reason: "No usable imaging found".to_string(),
            });
        }

        info!(
            patient_id = %patient_id,
            "Imaging available: {:?}",
            case.available_names()
        );

        let available = case.sequence_set(self.settings.unrecognised)?;
        let entry = resolve(&available)?;
        info!(
            patient_id = %patient_id,
            "Found candidate models: {}, {}",
            entry.tissue_model(),
            entry.abnormality_model()
        );

        let model_id = entry.model_for(self.settings.mode);
        let sequences: Vec<_> = entry.sequences().iter().collect();

        if self.settings.dry_run {
            let area = self.stager.planned(&case.directory);
            let request = self.request_for(area.input_dir(), area.output_dir(), model_id);
            let command = self.predictor.command_line(&request);
            info!(patient_id = %patient_id, "Dry run: {}", command);
            return Ok(PatientOutcome::Planned {
                model_id: model_id.to_string(),
                sequences,
                command,
            });
        }

        let area = self.stager.prepare(&case.directory)?;
        if let Err(e) = area.stage(&case, entry) {
            self.cleanup(&area, patient_id);
            return Err(e.into());
        }

        let request = self.request_for(area.input_dir(), area.output_dir(), model_id);
        info!(
            patient_id = %patient_id,
            "Running {} inference...",
            self.settings.mode.description()
        );
        info!(patient_id = %patient_id, "{}", self.predictor.command_line(&request));

        let result = self.predictor.predict(&request).await;
        self.cleanup(&area, patient_id);
        let output = result?;

        debug!(
            patient_id = %patient_id,
            "Predictor output (tail):\n{}",
            output.stdout_tail(PREDICTOR_LOG_LINES)
        );

        info!(patient_id = %patient_id, model = model_id, "Inference complete!");

        Ok(PatientOutcome::Completed {
            model_id: model_id.to_string(),
            sequences,
        })
    }

    fn request_for(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        model_id: &str,
    ) -> PredictionRequest {
        PredictionRequest {
            input_dir: input_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            model_id: model_id.to_string(),
            fold: self.settings.fold.clone(),
        }
    }

    /// Remove staged inputs unless retention was requested; failures are
    /// only logged
    fn cleanup(&self, area: &StagingArea, patient_id: &str) {
        if self.settings.keep_staging {
            info!(
                patient_id = %patient_id,
                staging_dir = %area.input_dir().display(),
                "Keeping temporary files"
            );
            return;
        }

        info!(patient_id = %patient_id, "Cleaning up");
        if let Err(e) = area.cleanup() {
            warn!(patient_id = %patient_id, error = %e, "Failed to remove staging directory");
        }
    }
}
