//! Input staging for the external predictor
//!
//! Layout per patient:
//!
//! ```text
//! {patient_dir}/segmentation/          predictor output
//! {patient_dir}/segmentation/tmpdir/   staged inputs (image_0000.nii.gz, ...)
//! ```

use crate::models::{ModelEntry, PatientCase, Sequence};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Output directory name inside each patient directory
pub const SEGMENTATION_DIR: &str = "segmentation";

/// Staging directory name inside the output directory
pub const STAGING_DIR: &str = "tmpdir";

/// Staging errors
#[derive(Debug, Error)]
pub enum StageError {
    /// Could not create an output or staging directory
    #[error("Failed to create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Could not remove a directory
    #[error("Failed to remove {path}: {source}")]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Could not copy a source volume into the staging directory
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The case has no volume for a sequence the model needs
    #[error("No source volume for sequence {0}")]
    MissingVolume(Sequence),

    /// The model entry has no staged name for a sequence
    #[error("No staged file name for sequence {0}")]
    MissingRemap(Sequence),
}

/// Creates staging areas
#[derive(Debug, Default, Clone, Copy)]
pub struct Stager;

impl Stager {
    pub fn new() -> Self {
        Self
    }

    /// Reset `{patient_dir}/segmentation` and create an empty staging
    /// directory inside it
    ///
    /// Any previous segmentation output for the patient is removed.
    pub fn prepare(&self, patient_dir: &Path) -> Result<StagingArea, StageError> {
        let output_dir = patient_dir.join(SEGMENTATION_DIR);
        let input_dir = output_dir.join(STAGING_DIR);

        remove_dir_if_present(&output_dir)?;

        std::fs::create_dir_all(&input_dir).map_err(|source| StageError::CreateDir {
            path: input_dir.clone(),
            source,
        })?;

        tracing::debug!(staging_dir = %input_dir.display(), "Staging directory prepared");

        Ok(StagingArea {
            output_dir,
            input_dir,
        })
    }

    /// Where a patient's staging area lives, without touching the filesystem
    pub fn planned(&self, patient_dir: &Path) -> StagingArea {
        let output_dir = patient_dir.join(SEGMENTATION_DIR);
        let input_dir = output_dir.join(STAGING_DIR);
        StagingArea {
            output_dir,
            input_dir,
        }
    }
}

/// A patient's output and staging directories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    output_dir: PathBuf,
    input_dir: PathBuf,
}

impl StagingArea {
    /// Predictor output directory (`segmentation/`)
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Predictor input directory (`segmentation/tmpdir/`)
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Copy each of the entry's sequences under its staged name
    ///
    /// Returns the staged paths in channel order.
    pub fn stage(&self, case: &PatientCase, entry: &ModelEntry) -> Result<Vec<PathBuf>, StageError> {
        let mut staged = Vec::with_capacity(entry.sequences().len());

        for sequence in entry.sequences().iter() {
            let volume = case
                .volume_for(sequence)
                .ok_or(StageError::MissingVolume(sequence))?;
            let name = entry
                .staged_name(sequence)
                .ok_or(StageError::MissingRemap(sequence))?;
            let target = self.input_dir.join(name);

            std::fs::copy(&volume.path, &target).map_err(|source| StageError::Copy {
                from: volume.path.clone(),
                to: target.clone(),
                source,
            })?;

            tracing::debug!(
                patient_id = %case.patient_id,
                from = %volume.path.display(),
                to = %target.display(),
                "Staged volume"
            );
            staged.push(target);
        }

        Ok(staged)
    }

    /// Remove the staging directory; a missing directory is not an error
    pub fn cleanup(&self) -> Result<(), StageError> {
        remove_dir_if_present(&self.input_dir)
    }
}

fn remove_dir_if_present(path: &Path) -> Result<(), StageError> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(StageError::RemoveDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_prepare_creates_layout() {
        let temp = TempDir::new().unwrap();
        let area = Stager::new().prepare(temp.path()).unwrap();

        assert!(area.input_dir().is_dir());
        assert_eq!(area.output_dir(), temp.path().join("segmentation"));
        assert_eq!(area.input_dir(), temp.path().join("segmentation").join("tmpdir"));
    }

    #[test]
    fn test_prepare_clears_previous_output() {
        let temp = TempDir::new().unwrap();
        let old = temp.path().join("segmentation").join("image.nii.gz");
        std::fs::create_dir_all(old.parent().unwrap()).unwrap();
        std::fs::write(&old, b"old").unwrap();

        Stager::new().prepare(temp.path()).unwrap();
        assert!(!old.exists());
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let area = Stager::new().prepare(temp.path()).unwrap();

        area.cleanup().unwrap();
        assert!(!area.input_dir().exists());
        assert!(area.output_dir().exists());
        area.cleanup().unwrap();
    }

    #[test]
    fn test_planned_does_not_touch_disk() {
        let temp = TempDir::new().unwrap();
        let area = Stager::new().planned(temp.path());
        assert!(!area.output_dir().exists());
    }
}
