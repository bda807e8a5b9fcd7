//! Record sources: lazy, restartable sequences of record batches.
//!
//! A source stands for one logical unit of input (typically one reporting
//! period). Opening it yields a fresh stream; the stream ends when the input
//! is exhausted. Nothing is read ahead beyond the batch being produced.

pub mod csv;
pub mod parquet;
pub mod period;
pub mod retry;

use arrow::record_batch::RecordBatch;

use crate::error::{ExtractError, Result};

pub use self::csv::CsvFileSource;
pub use self::parquet::ParquetFileSource;
pub use period::{PeriodCatalog, PeriodSource, ReportingPeriod};
pub use retry::{ResilientStream, is_transient, open_with_retry};

/// A lazy sequence of batches; `None` is the terminal signal
pub type BatchStream<'a> = Box<dyn Iterator<Item = Result<RecordBatch>> + 'a>;

/// A restartable provider of record batches for one logical unit
pub trait RecordSource {
    /// Name of the unit, used in logs and run summaries
    fn label(&self) -> String;

    /// Start a new pass over the unit
    ///
    /// Every call begins again from the first record. Batches hold at most
    /// `batch_size` rows.
    ///
    /// # Errors
    /// Returns [`ExtractError::SourceUnavailable`] when the unit does not
    /// exist, or an I/O error when it cannot be read
    fn open(&self, batch_size: usize) -> Result<BatchStream<'_>>;
}

impl<T: RecordSource + ?Sized> RecordSource for Box<T> {
    fn label(&self) -> String {
        (**self).label()
    }

    fn open(&self, batch_size: usize) -> Result<BatchStream<'_>> {
        (**self).open(batch_size)
    }
}

/// A source over batches already in memory
///
/// Batches are re-sliced to `batch_size` rows on open; slicing shares the
/// underlying buffers.
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    batches: Vec<RecordBatch>,
}

impl MemorySource {
    #[must_use]
    pub fn new(label: impl Into<String>, batches: Vec<RecordBatch>) -> Self {
        Self {
            label: label.into(),
            batches,
        }
    }

    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }
}

impl RecordSource for MemorySource {
    fn label(&self) -> String {
        self.label.clone()
    }

    fn open(&self, batch_size: usize) -> Result<BatchStream<'_>> {
        if batch_size == 0 {
            return Err(ExtractError::Config("batch size must be positive".to_string()));
        }

        Ok(Box::new(self.batches.iter().flat_map(move |batch| {
            let rows = batch.num_rows();
            (0..rows)
                .step_by(batch_size)
                .map(move |offset| Ok(batch.slice(offset, batch_size.min(rows - offset))))
        })))
    }
}
