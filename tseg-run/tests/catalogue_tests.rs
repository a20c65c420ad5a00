//! Model catalogue resolution tests
//!
//! Exhaustive over the 15 non-empty sequence subsets.

use tseg_run::models::{catalogue, resolve, InferenceMode, ResolveError, Sequence, SequenceSet};

#[test]
fn test_every_subset_resolves_to_its_own_entry() {
    for set in SequenceSet::all_non_empty() {
        let entry = resolve(&set).unwrap_or_else(|e| panic!("{} did not resolve: {}", set, e));
        assert_eq!(entry.sequences(), set);

        // Remap domain equals the subset
        let sources: Vec<String> = entry.remap_table().into_iter().map(|(src, _)| src).collect();
        let expected: Vec<String> = set.iter().map(|s| s.source_file_name()).collect();
        assert_eq!(sources, expected, "remap domain for {}", set);
    }
}

#[test]
fn test_remap_positions_follow_channel_order() {
    for entry in catalogue() {
        for (pos, (source, staged)) in entry.remap_table().iter().enumerate() {
            assert_eq!(staged, &format!("image_{:04}.nii.gz", pos), "{} in {}", source, entry.sequences());
        }

        let members: Vec<Sequence> = entry.sequences().iter().collect();
        let mut sorted = members.clone();
        sorted.sort();
        assert_eq!(members, sorted);
    }
}

#[test]
fn test_flair_t1ce_example() {
    let set = SequenceSet::from_slice(&[Sequence::T1ce, Sequence::Flair]);
    let entry = resolve(&set).unwrap();

    assert_eq!(
        entry.remap_table(),
        vec![
            ("FLAIR.nii.gz".to_string(), "image_0000.nii.gz".to_string()),
            ("T1CE.nii.gz".to_string(), "image_0001.nii.gz".to_string()),
        ]
    );
    assert_eq!(entry.tissue_model(), "Task900_BrainTumour2021_FlairT1CE");
    assert_eq!(entry.abnormality_model(), "Task910_BrainTumour2021_FlairT1CEAbnormality");
}

#[test]
fn test_t1ce_sorts_before_t2() {
    let set = SequenceSet::from_slice(&[Sequence::T2, Sequence::T1ce]);
    let entry = resolve(&set).unwrap();

    assert_eq!(entry.staged_name(Sequence::T1ce).as_deref(), Some("image_0000.nii.gz"));
    assert_eq!(entry.staged_name(Sequence::T2).as_deref(), Some("image_0001.nii.gz"));
    assert_eq!(entry.tissue_model(), "Task903_BrainTumour2021_T2T1CE");
}

#[test]
fn test_all_four_sequences() {
    let set: SequenceSet = Sequence::ALL.into_iter().collect();
    let entry = resolve(&set).unwrap();

    assert_eq!(entry.staged_name(Sequence::T2).as_deref(), Some("image_0003.nii.gz"));
    assert_eq!(
        entry.model_for(InferenceMode::Tissue),
        "Task918_BrainTumour2021_allseq_bratsonly"
    );
    assert_eq!(
        entry.model_for(InferenceMode::Abnormality),
        "Task919_BrainTumour2021_allseq_bratsonly_abnormality"
    );
}

#[test]
fn test_mode_selects_model_variant() {
    for entry in catalogue() {
        assert_eq!(entry.model_for(InferenceMode::Tissue), entry.tissue_model());
        assert_eq!(entry.model_for(InferenceMode::Abnormality), entry.abnormality_model());
        assert!(entry.abnormality_model().to_lowercase().contains("abnormality"));
        assert!(!entry.tissue_model().to_lowercase().contains("abnormality"));
    }
}

#[test]
fn test_empty_set_is_rejected() {
    assert_eq!(resolve(&SequenceSet::empty()), Err(ResolveError::NoImaging));
}
