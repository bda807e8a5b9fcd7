//! Output sinks for classified batches.

pub mod csv;

use arrow::record_batch::RecordBatch;

use crate::error::Result;

pub use self::csv::CsvSink;

/// A destination that accepts batches in order
pub trait RecordSink {
    /// Append the rows of `batch`
    ///
    /// A header is written before the rows only when `header_needed` is true.
    /// Appending a batch without rows is a no-op.
    fn append(&mut self, batch: &RecordBatch, header_needed: bool) -> Result<()>;

    /// Flush anything buffered
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn append(&mut self, batch: &RecordBatch, header_needed: bool) -> Result<()> {
        (**self).append(batch, header_needed)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Collects appended batches in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<RecordBatch>,
    header_flags: Vec<bool>,
    finished: bool,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches received, in order
    #[must_use]
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// The `header_needed` flag of every non-empty append, in order
    #[must_use]
    pub fn header_flags(&self) -> &[bool] {
        &self.header_flags
    }

    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, batch: &RecordBatch, header_needed: bool) -> Result<()> {
        if batch.num_rows() == 0 {
            return Ok(());
        }
        self.batches.push(batch.clone());
        self.header_flags.push(header_needed);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
