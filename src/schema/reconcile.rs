//! Renaming a batch's columns to canonical field names.

use std::sync::Arc;

use arrow::datatypes::{FieldRef, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::schema::aliases::AliasTable;
use crate::schema::normalize::resolve;

/// Rename bound columns of `batch` to their canonical names
///
/// Columns without a binding keep their original name so later stages that
/// still rely on source spellings keep working. Column data is shared with the
/// input batch; only the schema is rebuilt.
///
/// # Arguments
/// * `batch` - The batch as produced by a record source
/// * `table` - The alias table to resolve against
///
/// # Returns
/// A batch with the same rows and columns, canonical names where bound
pub fn reconcile(batch: &RecordBatch, table: &AliasTable) -> Result<RecordBatch> {
    let schema = batch.schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    let binding = resolve(&names, table);

    if binding.is_identity() {
        return Ok(batch.clone());
    }

    let fields: Vec<FieldRef> = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(idx, field)| match binding.canonical_at(idx) {
            Some(canonical) if canonical != field.name() => {
                log::trace!("Renaming column {} -> {canonical}", field.name());
                Arc::new(field.as_ref().clone().with_name(canonical))
            }
            _ => Arc::clone(field),
        })
        .collect();

    let renamed = Schema::new_with_metadata(fields, schema.metadata().clone());
    Ok(RecordBatch::try_new(
        Arc::new(renamed),
        batch.columns().to_vec(),
    )?)
}
