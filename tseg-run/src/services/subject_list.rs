//! Subject list loading
//!
//! One patient identifier per line. Blank lines and `#` comments are
//! skipped; surrounding whitespace is trimmed.

use std::collections::HashSet;
use std::path::Path;
use tseg_common::{Error, Result};

/// Read and parse a subject list file
pub fn load_subjects(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(Error::NotFound(format!("subject list {}", path.display())));
    }

    let content = std::fs::read_to_string(path)?;
    let subjects = parse_subjects(&content);

    if subjects.is_empty() {
        return Err(Error::InvalidInput(format!(
            "subject list {} contains no identifiers",
            path.display()
        )));
    }

    Ok(subjects)
}

/// Parse subject list content
///
/// Duplicates are kept (each occurrence is processed) but logged.
pub fn parse_subjects(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut subjects = Vec::new();

    for line in content.lines() {
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => line,
        };
        let id = line.trim();
        if id.is_empty() {
            continue;
        }

        if !seen.insert(id.to_string()) {
            tracing::warn!(patient_id = id, "Duplicate entry in subject list");
        }
        subjects.push(id.to_string());
    }

    subjects
}
