//! Error handling for the extract pipeline.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Which carrier identity the selector was looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierKind {
    /// Operating carrier (`OP_UNIQUE_CARRIER`)
    Operating,
    /// Marketing / reporting carrier (`MKT_UNIQUE_CARRIER`)
    Marketing,
}

impl std::fmt::Display for CarrierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Operating => write!(f, "operating"),
            Self::Marketing => write!(f, "marketing"),
        }
    }
}

/// Errors raised by sources, pipeline stages and sinks
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No column in the batch can identify the requested carrier
    #[error("Schema error: no {kind} carrier column resolvable; available columns: {available:?}")]
    Schema {
        kind: CarrierKind,
        available: Vec<String>,
    },

    /// A column required by a filter is missing from the batch
    #[error("Schema error: missing {what} column; available columns: {available:?}")]
    MissingColumn {
        what: String,
        available: Vec<String>,
    },

    /// The record source for one logical unit could not be obtained
    #[error("Source unavailable for {unit}: {reason}")]
    SourceUnavailable { unit: String, reason: String },

    /// Pulling data failed after the retry budget was spent
    #[error("Transient I/O failure for {unit} after {attempts} attempt(s): {source}")]
    TransientIo {
        unit: String,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    /// Not a single unit contributed output
    #[error("No data collected from {units} unit(s); check the catalog and alias table")]
    EmptyResult { units: usize },

    /// Writing to the output failed; never skipped per unit
    #[error("Sink error: {0}")]
    Sink(#[source] Box<ExtractError>),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error with the offending path
    #[error("IO error at {path}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Plain I/O error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Attach a path to an I/O error
    pub fn with_path(source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::PathIo {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only means a unit is absent
    ///
    /// Soft errors skip the unit whatever the failure mode.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}

/// Result type for extract operations
pub type Result<T> = std::result::Result<T, ExtractError>;
