//! Domain types: sequences, the model catalogue and per-patient cases

pub mod case;
pub mod catalogue;
pub mod mode;
pub mod sequence;

pub use case::{DiscoveredVolume, PatientCase, UnrecognisedPolicy};
pub use catalogue::{catalogue, resolve, ModelEntry, ResolveError};
pub use mode::InferenceMode;
pub use sequence::{Sequence, SequenceSet};
