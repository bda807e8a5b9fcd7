//! CSV record source

use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::Schema;

use crate::error::util::safe_open_file;
use crate::error::{ExtractError, Result};
use crate::schema::adapt::string_schema;
use crate::source::{BatchStream, RecordSource};

/// Streams a CSV file with every column read as nullable UTF-8
///
/// Only the header line is inspected up front; rows are parsed one batch at
/// a time. Empty fields come back as nulls.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
    label: String,
}

impl CsvFileSource {
    /// Create a source labelled with the file name
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }

    /// Create a source with an explicit label
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

impl RecordSource for CsvFileSource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn open(&self, batch_size: usize) -> Result<BatchStream<'_>> {
        stream(&self.path, &self.label, batch_size)
    }
}

/// Open `path` as a stream of UTF-8 batches of at most `batch_size` rows
///
/// # Errors
/// Returns [`ExtractError::SourceUnavailable`] if the file does not exist and
/// an I/O or Arrow error if the header cannot be read
pub fn stream(path: &Path, label: &str, batch_size: usize) -> Result<BatchStream<'static>> {
    if batch_size == 0 {
        return Err(ExtractError::Config("batch size must be positive".to_string()));
    }

    let mut file = safe_open_file(path, label)?;
    let schema = read_header(&mut file, path)?;

    if schema.fields().is_empty() {
        log::debug!("{} has no header, treating as empty", path.display());
        return Ok(Box::new(std::iter::empty()));
    }

    log::debug!(
        "Streaming {} ({} columns, batch size {batch_size})",
        path.display(),
        schema.fields().len()
    );

    let reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .with_batch_size(batch_size)
        .build(file)?;

    Ok(Box::new(reader.map(|batch| batch.map_err(ExtractError::from))))
}

/// Read the header line and rewind so the reader starts from the top
fn read_header(file: &mut File, path: &Path) -> Result<Schema> {
    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(&mut *file, Some(0))?;
    file.rewind()
        .map_err(|e| ExtractError::with_path(e, path))?;
    Ok(string_schema(&inferred))
}
