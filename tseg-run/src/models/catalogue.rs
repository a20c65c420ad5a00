//! Pre-trained model catalogue
//!
//! One entry per non-empty subset of the four sequences. Each entry names a
//! tissue-class model and an abnormality model trained on exactly that
//! subset, with input channels ordered FLAIR < T1 < T1CE < T2.

use super::{InferenceMode, Sequence, SequenceSet};
use thiserror::Error;

use super::Sequence::{Flair, T1ce, T1, T2};

/// Resolution errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// No qualifying volumes at all
    #[error("No usable imaging found")]
    NoImaging,

    /// The available volumes do not form a catalogued combination
    #[error("Unsupported sequence combination: [{}]", .found.join(", "))]
    UnsupportedCombination { found: Vec<String> },

    /// Two files normalise to the same sequence
    #[error("Sequence {sequence} provided by both {first} and {second}")]
    DuplicateSequence {
        sequence: Sequence,
        first: String,
        second: String,
    },
}

/// A catalogued sequence subset and the models trained on it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    sequences: SequenceSet,
    tissue_model: &'static str,
    abnormality_model: &'static str,
}

const fn entry(
    sequences: &[Sequence],
    tissue_model: &'static str,
    abnormality_model: &'static str,
) -> ModelEntry {
    ModelEntry {
        sequences: SequenceSet::from_slice(sequences),
        tissue_model,
        abnormality_model,
    }
}

static CATALOGUE: [ModelEntry; 15] = [
    // one sequence
    entry(&[Flair], "Task890_BrainTumour2021_Flair", "Task894_BrainTumour2021_FlairAbnormality"),
    entry(&[T1], "Task891_BrainTumour2021_T1", "Task895_BrainTumour2021_T1Abnormality"),
    entry(&[T2], "Task892_BrainTumour2021_T2", "Task896_BrainTumour2021_T2Abnormality"),
    entry(&[T1ce], "Task893_BrainTumour2021_T1CE", "Task897_BrainTumour2021_T1CEAbnormality"),
    // two sequences
    entry(&[Flair, T1], "Task898_BrainTumour2021_FlairT1", "Task908_BrainTumour2021_FlairT1Abnormality"),
    entry(&[Flair, T2], "Task899_BrainTumour2021_FlairT2", "Task909_BrainTumour2021_FlairT2Abnormality"),
    entry(&[Flair, T1ce], "Task900_BrainTumour2021_FlairT1CE", "Task910_BrainTumour2021_FlairT1CEAbnormality"),
    entry(&[T1, T2], "Task901_BrainTumour2021_T1T2", "Task911_BrainTumour2021_T1T2Abnormality"),
    entry(&[T1, T1ce], "Task902_BrainTumour2021_T1T1CE", "Task912_BrainTumour2021_T1T1CEAbnormality"),
    entry(&[T1ce, T2], "Task903_BrainTumour2021_T2T1CE", "Task913_BrainTumour2021_T2T1CEAbnormality"),
    // three sequences
    entry(&[Flair, T1, T2], "Task904_BrainTumour2021_FlairT1T2", "Task914_BrainTumour2021_FlairT1T2Abnormality"),
    entry(&[Flair, T1, T1ce], "Task905_BrainTumour2021_FlairT1T1CE", "Task915_BrainTumour2021_FlairT1T1CEAbnormality"),
    entry(&[Flair, T1ce, T2], "Task906_BrainTumour2021_FlairT2T1CE", "Task916_BrainTumour2021_FlairT2T1CEAbnormality"),
    entry(&[T1, T1ce, T2], "Task907_BrainTumour2021_T1T2T1CE", "Task917_BrainTumour2021_T1T2T1CEAbnormality"),
    // all four
    entry(
        &[Flair, T1, T1ce, T2],
        "Task918_BrainTumour2021_allseq_bratsonly",
        "Task919_BrainTumour2021_allseq_bratsonly_abnormality",
    ),
];

/// The full catalogue
pub fn catalogue() -> &'static [ModelEntry] {
    &CATALOGUE
}

/// Find the entry trained on exactly `available`
///
/// No subset or best-effort matching is attempted.
pub fn resolve(available: &SequenceSet) -> Result<&'static ModelEntry, ResolveError> {
    if available.is_empty() {
        return Err(ResolveError::NoImaging);
    }

    CATALOGUE
        .iter()
        .find(|entry| entry.sequences == *available)
        .ok_or_else(|| ResolveError::UnsupportedCombination {
            found: available.names(),
        })
}

impl ModelEntry {
    pub fn sequences(&self) -> SequenceSet {
        self.sequences
    }

    pub fn tissue_model(&self) -> &'static str {
        self.tissue_model
    }

    pub fn abnormality_model(&self) -> &'static str {
        self.abnormality_model
    }

    /// Model identifier for the requested mode
    pub fn model_for(&self, mode: InferenceMode) -> &'static str {
        match mode {
            InferenceMode::Tissue => self.tissue_model,
            InferenceMode::Abnormality => self.abnormality_model,
        }
    }

    /// Staged file name (`image_0000.nii.gz`, ...) for one of this entry's
    /// sequences
    pub fn staged_name(&self, sequence: Sequence) -> Option<String> {
        self.sequences
            .position(sequence)
            .map(|pos| format!("image_{:04}.nii.gz", pos))
    }

    /// `(source file name, staged file name)` pairs in channel order
    pub fn remap_table(&self) -> Vec<(String, String)> {
        self.sequences
            .iter()
            .enumerate()
            .map(|(pos, seq)| (seq.source_file_name(), format!("image_{:04}.nii.gz", pos)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_covers_every_subset_once() {
        for set in SequenceSet::all_non_empty() {
            let matches = catalogue().iter().filter(|e| e.sequences() == set).count();
            assert_eq!(matches, 1, "{} should appear exactly once", set);
        }
        assert_eq!(catalogue().len(), 15);
    }

    #[test]
    fn test_model_ids_are_distinct() {
        let mut ids: Vec<&str> = catalogue()
            .iter()
            .flat_map(|e| [e.tissue_model(), e.abnormality_model()])
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 30);
    }

    #[test]
    fn test_empty_set_is_no_imaging() {
        assert_eq!(resolve(&SequenceSet::empty()), Err(ResolveError::NoImaging));
    }

    #[test]
    fn test_staged_name_outside_entry() {
        let entry = resolve(&SequenceSet::from_slice(&[T1])).unwrap();
        assert_eq!(entry.staged_name(T1).as_deref(), Some("image_0000.nii.gz"));
        assert_eq!(entry.staged_name(T2), None);
    }

    #[test]
    fn test_unsupported_combination_message() {
        let err = ResolveError::UnsupportedCombination {
            found: vec!["DWI".to_string(), "FLAIR".to_string()],
        };
        assert_eq!(err.to_string(), "Unsupported sequence combination: [DWI, FLAIR]");
    }
}
