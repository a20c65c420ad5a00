//! Patient directory scanner
//!
//! Lists the qualifying volumes directly inside `{root}/{patient_id}`:
//! regular files ending in `.nii.gz` whose name does not contain `mask`.
//! Sub-directories (including a previous `segmentation/` output) are not
//! descended into.

use crate::models::{DiscoveredVolume, PatientCase, Sequence};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Volume file suffix
const VOLUME_SUFFIX: &str = ".nii.gz";

/// Optional prefix carried by already-renamed volumes
const STAGED_PREFIX: &str = "image_";

/// Patient scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Patient directory does not exist
    #[error("Patient directory not found: {0}")]
    PatientNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Identifier would escape the patient root
    #[error("Invalid patient identifier: {0:?}")]
    InvalidPatientId(String),

    /// General I/O error
    #[error("I/O error scanning {0}: {1}")]
    Io(PathBuf, String),
}

/// Patient directory scanner
pub struct CaseScanner {
    exclude_patterns: Vec<String>,
}

impl Default for CaseScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CaseScanner {
    /// Create a scanner that skips segmentation masks
    ///
    /// Both the `.nii.gz` suffix and the `mask` exclusion are matched
    /// ignoring case, like sequence names, so `T1.NII.GZ` is a volume and
    /// `Mask_T1.nii.gz` is skipped.
    pub fn new() -> Self {
        Self {
            exclude_patterns: vec!["mask".to_string()],
        }
    }

    /// Build the [`PatientCase`] for one patient
    pub fn scan(&self, root: &Path, patient_id: &str) -> Result<PatientCase, ScanError> {
        validate_patient_id(patient_id)?;

        let directory = root.join(patient_id);
        if !directory.exists() {
            return Err(ScanError::PatientNotFound(directory));
        }
        if !directory.is_dir() {
            return Err(ScanError::NotADirectory(directory));
        }

        let walker = WalkDir::new(&directory)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        let mut volumes = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if e.depth() == 0 {
                        return Err(ScanError::Io(directory, e.to_string()));
                    }
                    tracing::warn!(patient_id, "Error accessing entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if !self.is_candidate(&file_name) {
                tracing::debug!(patient_id, file = %file_name, "Skipping non-volume file");
                continue;
            }

            let stem = normalise_stem(&file_name);
            volumes.push(DiscoveredVolume {
                path: entry.path().to_path_buf(),
                sequence: Sequence::from_stem(&stem),
                stem,
            });
        }

        tracing::debug!(
            patient_id,
            volumes = volumes.len(),
            "Patient directory scanned"
        );

        Ok(PatientCase {
            patient_id: patient_id.to_string(),
            directory,
            volumes,
        })
    }

    fn is_candidate(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        if !lower.ends_with(VOLUME_SUFFIX) {
            return false;
        }
        !self
            .exclude_patterns
            .iter()
            .any(|pattern| lower.contains(pattern.as_str()))
    }
}

/// `image_FLAIR.nii.gz` → `FLAIR`
fn normalise_stem(file_name: &str) -> String {
    let stem = file_name
        .get(..file_name.len().saturating_sub(VOLUME_SUFFIX.len()))
        .unwrap_or(file_name);
    let stem = match stem.get(..STAGED_PREFIX.len()) {
        Some(prefix)
            if prefix.eq_ignore_ascii_case(STAGED_PREFIX) && stem.len() > STAGED_PREFIX.len() =>
        {
            &stem[STAGED_PREFIX.len()..]
        }
        _ => stem,
    };
    stem.to_string()
}

/// Reject identifiers that are empty or are not a single path component
fn validate_patient_id(patient_id: &str) -> Result<(), ScanError> {
    let mut components = Path::new(patient_id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(ScanError::InvalidPatientId(patient_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_stem() {
        assert_eq!(normalise_stem("FLAIR.nii.gz"), "FLAIR");
        assert_eq!(normalise_stem("image_T1CE.nii.gz"), "T1CE");
        assert_eq!(normalise_stem("IMAGE_t2.NII.GZ"), "t2");
        assert_eq!(normalise_stem("image_.nii.gz"), "image_");
    }

    #[test]
    fn test_candidate_filter() {
        let scanner = CaseScanner::new();
        assert!(scanner.is_candidate("T1.nii.gz"));
        assert!(scanner.is_candidate("T1.NII.GZ"));
        assert!(!scanner.is_candidate("T1.nii"));
        assert!(!scanner.is_candidate("FLAIR_mask.nii.gz"));
        assert!(!scanner.is_candidate("brainMask.nii.gz"));
        assert!(!scanner.is_candidate("notes.txt"));
    }

    #[test]
    fn test_patient_id_validation() {
        assert!(validate_patient_id("sub-001").is_ok());
        assert!(validate_patient_id("").is_err());
        assert!(validate_patient_id("..").is_err());
        assert!(validate_patient_id("a/b").is_err());
        assert!(validate_patient_id("/abs").is_err());
    }
}
