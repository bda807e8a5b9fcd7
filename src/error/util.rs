//! Utility functions for error handling
//!
//! Helpers that turn raw filesystem failures into the taxonomy the pipeline
//! reacts to: a missing extract is `SourceUnavailable`, anything else stays an
//! I/O error carrying its path so the retry boundary can decide.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{ExtractError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `unit` - Label of the logical unit the file belongs to (for error context)
///
/// # Returns
/// * `Result<fs::File>` - The opened file or a classified error
pub fn safe_open_file(path: &Path, unit: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(ExtractError::SourceUnavailable {
            unit: unit.to_string(),
            reason: format!("file not found: {}", path.display()),
        });
    }

    if !path.is_file() {
        return Err(ExtractError::SourceUnavailable {
            unit: unit.to_string(),
            reason: format!("path is not a file: {}", path.display()),
        });
    }

    match fs::File::open(path) {
        Ok(file) => Ok(file),
        // Deleted between the existence check and the open
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ExtractError::SourceUnavailable {
            unit: unit.to_string(),
            reason: format!("file disappeared: {}", path.display()),
        }),
        Err(e) => Err(ExtractError::with_path(e, path)),
    }
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => {
            ExtractError::Config(format!("{purpose} not found: {}", path.display()))
        }
        io::ErrorKind::InvalidData => ExtractError::Config(format!(
            "{purpose} contains invalid UTF-8: {}",
            path.display()
        )),
        _ => ExtractError::with_path(e, path),
    })
}
