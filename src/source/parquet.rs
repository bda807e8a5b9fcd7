//! Parquet record source

use std::path::{Path, PathBuf};

use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::util::safe_open_file;
use crate::error::{ExtractError, Result};
use crate::schema::adapt::to_string_batch;
use crate::source::{BatchStream, RecordSource};

/// Streams a Parquet file, casting every column to nullable UTF-8
#[derive(Debug, Clone)]
pub struct ParquetFileSource {
    path: PathBuf,
    label: String,
}

impl ParquetFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }

    #[must_use]
    pub fn with_label(path: impl Into<PathBuf>, label: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            label: label.into(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for ParquetFileSource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn open(&self, batch_size: usize) -> Result<BatchStream<'_>> {
        stream(&self.path, &self.label, batch_size)
    }
}

/// Open `path` as a stream of UTF-8 batches of at most `batch_size` rows
///
/// # Arguments
/// * `path` - Path to the Parquet file
/// * `label` - Unit label used in errors
/// * `batch_size` - Maximum rows per batch
///
/// # Errors
/// Returns [`ExtractError::SourceUnavailable`] if the file does not exist and
/// a Parquet error if the footer cannot be read
pub fn stream(path: &Path, label: &str, batch_size: usize) -> Result<BatchStream<'static>> {
    if batch_size == 0 {
        return Err(ExtractError::Config("batch size must be positive".to_string()));
    }

    let file = safe_open_file(path, label)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    log::debug!(
        "Streaming {} ({} rows in {} row groups, batch size {batch_size})",
        path.display(),
        builder.metadata().file_metadata().num_rows(),
        builder.metadata().num_row_groups()
    );

    let reader = builder.with_batch_size(batch_size).build()?;

    Ok(Box::new(reader.map(|batch| {
        let batch = batch?;
        to_string_batch(&batch)
    })))
}
