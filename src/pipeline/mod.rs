//! The classification pipeline and the chunked driver that feeds it.
//!
//! A batch passes through four stages, each returning a new batch:
//! reconcile column names, keep domestic flights, keep the target carrier,
//! project to the canonical output fields.

pub mod driver;

use arrow::record_batch::RecordBatch;

use crate::classify::{classify_domestic, select_carrier};
use crate::config::ExtractConfig;
use crate::error::Result;
use crate::schema::{AliasTable, CanonicalFieldSet, project, reconcile};

pub use driver::{
    CancellationToken, RunOptions, RunState, RunSummary, UnitReport, UnitStatus, run, run_units,
};

/// A per-batch transformation applied by the driver
pub trait BatchTransform {
    /// Transform one batch; an empty result contributes nothing
    fn transform(&self, batch: &RecordBatch) -> Result<RecordBatch>;
}

impl<T: BatchTransform + ?Sized> BatchTransform for &T {
    fn transform(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        (**self).transform(batch)
    }
}

/// Classification settings shared by every batch of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Carrier code rows must match exactly
    pub target_code: String,
    /// Filter on the marketing carrier when both carrier fields exist
    pub prefer_marketing: bool,
    /// Count US territories as domestic under the state signal
    pub include_territories: bool,
    /// Maximum rows per batch pulled from a source
    pub batch_size: usize,
}

impl From<&ExtractConfig> for PipelineOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            target_code: config.carrier.clone(),
            prefer_marketing: config.prefer_marketing,
            include_territories: config.include_territories,
            batch_size: config.batch_size,
        }
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&ExtractConfig::default())
    }
}

/// Reconcile, classify and project a batch
#[derive(Debug, Clone)]
pub struct ClassificationPipeline<'a> {
    aliases: &'a AliasTable,
    fields: &'a CanonicalFieldSet,
    options: PipelineOptions,
}

impl<'a> ClassificationPipeline<'a> {
    #[must_use]
    pub fn new(
        aliases: &'a AliasTable,
        fields: &'a CanonicalFieldSet,
        options: PipelineOptions,
    ) -> Self {
        Self {
            aliases,
            fields,
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }
}

impl BatchTransform for ClassificationPipeline<'_> {
    fn transform(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let batch = reconcile(batch, self.aliases)?;
        let batch = classify_domestic(&batch, self.options.include_territories)?;
        let batch = select_carrier(
            &batch,
            &self.options.target_code,
            self.options.prefer_marketing,
        )?;
        project(&batch, self.fields)
    }
}
