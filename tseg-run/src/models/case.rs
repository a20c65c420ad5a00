//! Per-patient volume inventory

use super::{ResolveError, Sequence, SequenceSet};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// How to treat volumes whose name is not a known sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnrecognisedPolicy {
    /// Any unrecognised volume makes the combination unsupported
    #[default]
    Strict,
    /// Unrecognised volumes are logged and left out of matching
    Ignore,
}

/// One qualifying volume file found in a patient directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredVolume {
    /// Absolute or root-relative path of the source file
    pub path: PathBuf,
    /// File name without `.nii.gz` and without an `image_` prefix
    pub stem: String,
    /// Sequence the stem names, if any
    pub sequence: Option<Sequence>,
}

impl DiscoveredVolume {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A patient and the volumes discovered for it
///
/// Rebuilt for every patient; nothing here outlives one iteration.
#[derive(Debug, Clone)]
pub struct PatientCase {
    pub patient_id: String,
    pub directory: PathBuf,
    pub volumes: Vec<DiscoveredVolume>,
}

impl PatientCase {
    pub fn has_imaging(&self) -> bool {
        !self.volumes.is_empty()
    }

    /// Stems of every discovered volume, sorted
    pub fn available_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.volumes.iter().map(|v| v.stem.clone()).collect();
        names.sort();
        names
    }

    /// Collapse the discovered volumes into a sequence set
    pub fn sequence_set(&self, policy: UnrecognisedPolicy) -> Result<SequenceSet, ResolveError> {
        if self.volumes.is_empty() {
            return Err(ResolveError::NoImaging);
        }

        let mut seen: HashMap<Sequence, &DiscoveredVolume> = HashMap::new();
        let mut unrecognised = Vec::new();

        for volume in &self.volumes {
            match volume.sequence {
                Some(sequence) => {
                    if let Some(first) = seen.insert(sequence, volume) {
                        return Err(ResolveError::DuplicateSequence {
                            sequence,
                            first: first.file_name(),
                            second: volume.file_name(),
                        });
                    }
                }
                None => unrecognised.push(volume),
            }
        }

        if !unrecognised.is_empty() {
            match policy {
                UnrecognisedPolicy::Strict => {
                    return Err(ResolveError::UnsupportedCombination {
                        found: self.available_names(),
                    });
                }
                UnrecognisedPolicy::Ignore => {
                    for volume in &unrecognised {
                        warn!(
                            patient_id = %self.patient_id,
                            file = %volume.path.display(),
                            "Ignoring unrecognised volume"
                        );
                    }
                }
            }
        }

        let set: SequenceSet = seen.keys().copied().collect();
        if set.is_empty() {
            return Err(ResolveError::UnsupportedCombination {
                found: self.available_names(),
            });
        }

        Ok(set)
    }

    /// Source volume for a sequence
    pub fn volume_for(&self, sequence: Sequence) -> Option<&DiscoveredVolume> {
        self.volumes.iter().find(|v| v.sequence == Some(sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(name: &str) -> DiscoveredVolume {
        let stem = name.trim_end_matches(".nii.gz").trim_start_matches("image_");
        DiscoveredVolume {
            path: PathBuf::from("/data/p1").join(name),
            stem: stem.to_string(),
            sequence: Sequence::from_stem(stem),
        }
    }

    fn case(names: &[&str]) -> PatientCase {
        PatientCase {
            patient_id: "p1".to_string(),
            directory: PathBuf::from("/data/p1"),
            volumes: names.iter().map(|n| volume(n)).collect(),
        }
    }

    #[test]
    fn test_recognised_volumes() {
        let set = case(&["T2.nii.gz", "FLAIR.nii.gz"])
            .sequence_set(UnrecognisedPolicy::Strict)
            .unwrap();
        assert_eq!(set, SequenceSet::from_slice(&[Sequence::Flair, Sequence::T2]));
    }

    #[test]
    fn test_no_volumes() {
        let result = case(&[]).sequence_set(UnrecognisedPolicy::Strict);
        assert_eq!(result, Err(ResolveError::NoImaging));
    }

    #[test]
    fn test_stray_file_strict() {
        let result = case(&["FLAIR.nii.gz", "DWI.nii.gz"]).sequence_set(UnrecognisedPolicy::Strict);
        assert_eq!(
            result,
            Err(ResolveError::UnsupportedCombination {
                found: vec!["DWI".to_string(), "FLAIR".to_string()],
            })
        );
    }

    #[test]
    fn test_stray_file_ignored() {
        let set = case(&["FLAIR.nii.gz", "DWI.nii.gz"])
            .sequence_set(UnrecognisedPolicy::Ignore)
            .unwrap();
        assert_eq!(set, SequenceSet::from_slice(&[Sequence::Flair]));
    }

    #[test]
    fn test_only_stray_files_even_when_ignoring() {
        let result = case(&["DWI.nii.gz"]).sequence_set(UnrecognisedPolicy::Ignore);
        assert!(matches!(result, Err(ResolveError::UnsupportedCombination { .. })));
    }

    #[test]
    fn test_duplicate_sequence() {
        let result = case(&["FLAIR.nii.gz", "image_flair.nii.gz"]).sequence_set(UnrecognisedPolicy::Strict);
        assert!(matches!(
            result,
            Err(ResolveError::DuplicateSequence { sequence: Sequence::Flair, .. })
        ));
    }
}
