//! Batch run report
//!
//! Per-patient outcomes plus batch totals; serialisable to JSON so a run
//! can be audited after the fact.

use crate::models::{InferenceMode, Sequence};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tseg_common::{Error, Result};
use uuid::Uuid;

/// What happened to one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatientOutcome {
    /// Inference ran and exited successfully
    Completed {
        model_id: String,
        sequences: Vec<Sequence>,
    },
    /// Dry run: model resolved, nothing executed
    Planned {
        model_id: String,
        sequences: Vec<Sequence>,
        command: String,
    },
    /// Nothing to do for this patient
    Skipped { reason: String },
    /// Patient-scoped failure
    Failed { kind: String, message: String },
}

impl PatientOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PatientOutcome::Failed { .. })
    }
}

/// One patient's entry in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientReport {
    pub patient_id: String,
    #[serde(flatten)]
    pub outcome: PatientOutcome,
    pub elapsed_seconds: f64,
}

/// Result of a whole batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub mode: InferenceMode,
    pub total_subjects: usize,
    pub patients: Vec<PatientReport>,
    /// Stopped early by Ctrl+C
    pub interrupted: bool,
    pub elapsed_seconds: f64,
}

impl BatchSummary {
    pub fn new(mode: InferenceMode, total_subjects: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            mode,
            total_subjects,
            patients: Vec::with_capacity(total_subjects),
            interrupted: false,
            elapsed_seconds: 0.0,
        }
    }

    pub fn completed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                PatientOutcome::Completed { .. } | PatientOutcome::Planned { .. }
            )
        })
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PatientOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(PatientOutcome::is_failure)
    }

    fn count(&self, pred: impl Fn(&PatientOutcome) -> bool) -> usize {
        self.patients.iter().filter(|p| pred(&p.outcome)).count()
    }

    /// Process exit code: 130 when interrupted, 1 when any patient failed
    pub fn exit_code(&self) -> i32 {
        if self.interrupted {
            130
        } else if self.failed() > 0 {
            1
        } else {
            0
        }
    }

    /// Write the summary as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("Serialize report failed: {}", e)))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn report(id: &str, outcome: PatientOutcome) -> PatientReport {
        PatientReport {
            patient_id: id.to_string(),
            outcome,
            elapsed_seconds: 1.0,
        }
    }

    #[test]
    fn test_counts_and_exit_code() {
        let mut summary = BatchSummary::new(InferenceMode::Tissue, 3);
        summary.patients.push(report(
            "a",
            PatientOutcome::Completed {
                model_id: "Task890_BrainTumour2021_Flair".to_string(),
                sequences: vec![Sequence::Flair],
            },
        ));
        summary.patients.push(report(
            "b",
            PatientOutcome::Skipped {
                reason: "No usable imaging found".to_string(),
            },
        ));
        assert_eq!(summary.exit_code(), 0);

        summary.patients.push(report(
            "c",
            PatientOutcome::Failed {
                kind: "inference_failed".to_string(),
                message: "exit 1".to_string(),
            },
        ));
        assert_eq!((summary.completed(), summary.skipped(), summary.failed()), (1, 1, 1));
        assert_eq!(summary.exit_code(), 1);

        summary.interrupted = true;
        assert_eq!(summary.exit_code(), 130);
    }

    #[test]
    fn test_outcome_json_shape() {
        let entry = report(
            "sub-01",
            PatientOutcome::Failed {
                kind: "unsupported_combination".to_string(),
                message: "Unsupported sequence combination: [DWI]".to_string(),
            },
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["patient_id"], "sub-01");
        assert_eq!(value["status"], "failed");
        assert_eq!(value["kind"], "unsupported_combination");
    }

    #[test]
    fn test_write_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("reports").join("run.json");
        let summary = BatchSummary::new(InferenceMode::Abnormality, 0);

        summary.write_json(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: BatchSummary = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.run_id, summary.run_id);
        assert_eq!(parsed.mode, InferenceMode::Abnormality);
    }
}
