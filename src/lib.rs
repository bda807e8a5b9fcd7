//! Streaming schema reconciliation and classification of monthly on-time
//! flight extracts.
//!
//! Extracts from different vintages name the same fields differently. Each
//! batch read from an extract is renamed to a canonical schema, reduced to
//! domestic flights of one carrier, projected to the output fields and
//! appended to a CSV file, one bounded batch at a time.

pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod schema;
pub mod sink;
pub mod source;
pub mod utils;

// Core types
pub use config::{DEFAULT_BATCH_SIZE, ExtractConfig, RetryPolicy, UnitFailureMode};
pub use error::{CarrierKind, ExtractError, Result};

// Arrow types
pub use arrow::datatypes::Schema as ArrowSchema;
pub use arrow::record_batch::RecordBatch;

// Schema reconciliation
pub use schema::{AliasEntry, AliasTable, CanonicalFieldSet, normalize_key, project, reconcile, resolve};

// Classification
pub use classify::{
    AirportFilter, CarrierResolution, DomesticSignal, classify_domestic, select_carrier,
};

// Pipeline
pub use pipeline::{
    BatchTransform, CancellationToken, ClassificationPipeline, PipelineOptions, RunOptions,
    RunState, RunSummary, UnitReport, UnitStatus, run, run_units,
};

// Sources and sinks
pub use sink::{CsvSink, MemorySink, RecordSink};
pub use source::{
    BatchStream, CsvFileSource, MemorySource, ParquetFileSource, PeriodCatalog, RecordSource,
    ReportingPeriod, open_with_retry,
};
