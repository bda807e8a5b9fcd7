//! Type adaptation between source batches and the string-typed pipeline.
//!
//! Every stage works on nullable UTF-8 columns. Sources whose files carry
//! typed columns (Parquet integers, dates, ...) are cast here, and sinks use
//! [`align_to_schema`] to fit every spooled batch to the final header.

use std::sync::Arc;

use arrow::array::{ArrayRef, new_null_array};
use arrow::compute::kernels::cast;
use arrow::datatypes::{DataType, Field, FieldRef, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::Result;

/// Whether every column of `schema` is already UTF-8
#[must_use]
pub fn is_string_schema(schema: &Schema) -> bool {
    schema
        .fields()
        .iter()
        .all(|f| f.data_type() == &DataType::Utf8)
}

/// Schema with the same names as `schema`, every field nullable UTF-8
#[must_use]
pub fn string_schema(schema: &Schema) -> Schema {
    let fields: Vec<FieldRef> = schema
        .fields()
        .iter()
        .map(|f| Arc::new(Field::new(f.name(), DataType::Utf8, true)))
        .collect();
    Schema::new_with_metadata(fields, schema.metadata().clone())
}

/// Cast every column of `batch` to nullable UTF-8
pub fn to_string_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    if is_string_schema(batch.schema_ref()) {
        return Ok(batch.clone());
    }

    let columns = batch
        .columns()
        .iter()
        .map(|column| {
            if column.data_type() == &DataType::Utf8 {
                Ok(Arc::clone(column))
            } else {
                cast::cast(column, &DataType::Utf8)
            }
        })
        .collect::<std::result::Result<Vec<ArrayRef>, _>>()?;

    let schema = string_schema(batch.schema_ref());
    Ok(RecordBatch::try_new(Arc::new(schema), columns)?)
}

/// Reshape `batch` to exactly the fields of `target`
///
/// Columns are matched by name. Fields missing from the batch become null
/// columns and batch columns outside `target` are left out.
pub fn align_to_schema(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let source = batch.schema();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(target.fields().len());

    for field in target.fields() {
        match source.index_of(field.name()) {
            Ok(idx) => {
                let column = batch.column(idx);
                if column.data_type() == field.data_type() {
                    columns.push(Arc::clone(column));
                } else {
                    columns.push(cast::cast(column, field.data_type())?);
                }
            }
            Err(_) => columns.push(new_null_array(field.data_type(), batch.num_rows())),
        }
    }

    Ok(RecordBatch::try_new(Arc::clone(target), columns)?)
}
