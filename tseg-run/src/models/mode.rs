//! Inference mode selection

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of the two model variants to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// Multiclass segmentation of tumour sub-regions
    #[default]
    Tissue,
    /// Binary/general lesion detection
    Abnormality,
}

impl InferenceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            InferenceMode::Tissue => "tissue",
            InferenceMode::Abnormality => "abnormality",
        }
    }

    /// Short description used in progress logs
    pub fn description(self) -> &'static str {
        match self {
            InferenceMode::Tissue => "tissue class",
            InferenceMode::Abnormality => "general abnormality",
        }
    }
}

impl fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
