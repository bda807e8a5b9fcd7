//! Reducing a batch to the canonical output fields.

use std::sync::Arc;

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::CanonicalFieldSet;

/// The "nothing to contribute" batch: zero rows, zero columns
#[must_use]
pub fn empty_batch() -> RecordBatch {
    RecordBatch::new_empty(Arc::new(Schema::empty()))
}

/// Keep only canonical output columns, in canonical order
///
/// Rows are untouched: the result has the same row count and order as the
/// input. When no canonical column is present the empty sentinel from
/// [`empty_batch`] is returned instead of a batch with rows but no fields.
pub fn project(batch: &RecordBatch, fields: &CanonicalFieldSet) -> Result<RecordBatch> {
    let schema = batch.schema();
    let indices: Vec<usize> = fields
        .iter()
        .filter_map(|name| schema.index_of(name).ok())
        .collect();

    if indices.is_empty() {
        return Ok(empty_batch());
    }

    Ok(batch.project(&indices)?)
}
