//! MRI sequence identifiers and sets of them

use serde::{Deserialize, Serialize};
use std::fmt;

/// One MRI acquisition type usable as a model input channel
///
/// The derived ordering (FLAIR < T1 < T1CE < T2) is the channel order the
/// trained models expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sequence {
    #[serde(rename = "FLAIR")]
    Flair = 0,
    #[serde(rename = "T1")]
    T1 = 1,
    #[serde(rename = "T1CE")]
    T1ce = 2,
    #[serde(rename = "T2")]
    T2 = 3,
}

impl Sequence {
    /// All sequences in channel order
    pub const ALL: [Sequence; 4] = [Sequence::Flair, Sequence::T1, Sequence::T1ce, Sequence::T2];

    /// Canonical upper-case name, as used in source file names
    pub const fn as_str(self) -> &'static str {
        match self {
            Sequence::Flair => "FLAIR",
            Sequence::T1 => "T1",
            Sequence::T1ce => "T1CE",
            Sequence::T2 => "T2",
        }
    }

    /// Source volume file name (`FLAIR.nii.gz`, ...)
    pub fn source_file_name(self) -> String {
        format!("{}.nii.gz", self.as_str())
    }

    /// Match a file stem against the canonical names, ignoring case
    pub fn from_stem(stem: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(stem.trim()))
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deduplicated, order-independent set of sequences
///
/// Stored as a 4-bit mask; iteration always yields channel order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SequenceSet(u8);

impl SequenceSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build a set at compile time (used by the model catalogue)
    pub const fn from_slice(sequences: &[Sequence]) -> Self {
        let mut mask = 0;
        let mut i = 0;
        while i < sequences.len() {
            mask |= sequences[i].bit();
            i += 1;
        }
        Self(mask)
    }

    /// Every non-empty subset of the four sequences (15 sets)
    pub fn all_non_empty() -> impl Iterator<Item = SequenceSet> {
        (1u8..16).map(SequenceSet)
    }

    /// Add a sequence; returns `false` if it was already present
    pub fn insert(&mut self, sequence: Sequence) -> bool {
        let present = self.contains(sequence);
        self.0 |= sequence.bit();
        !present
    }

    pub fn contains(&self, sequence: Sequence) -> bool {
        self.0 & sequence.bit() != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Members in channel order
    pub fn iter(&self) -> impl Iterator<Item = Sequence> {
        let set = *self;
        Sequence::ALL.into_iter().filter(move |s| set.contains(*s))
    }

    /// Zero-based channel position of `sequence` within this set
    pub fn position(&self, sequence: Sequence) -> Option<usize> {
        self.iter().position(|s| s == sequence)
    }

    /// Canonical names in channel order
    pub fn names(&self) -> Vec<String> {
        self.iter().map(|s| s.as_str().to_string()).collect()
    }
}

impl FromIterator<Sequence> for SequenceSet {
    fn from_iter<I: IntoIterator<Item = Sequence>>(iter: I) -> Self {
        let mut set = SequenceSet::empty();
        for sequence in iter {
            set.insert(sequence);
        }
        set
    }
}

impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.names().join(", "))
    }
}

impl fmt::Debug for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceSet{}", self)
    }
}
