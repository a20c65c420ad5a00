//! # tumour-seg common library
//!
//! Shared code for the tumour-seg tools:
//! - Error and result types
//! - TOML configuration loading, defaults and atomic write-back
//! - Human-readable elapsed time formatting

pub mod config;
pub mod error;
pub mod human_time;

pub use error::{Error, Result};
