use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use ontime_extract::config::RetryPolicy;
use ontime_extract::{RecordBatch, RunOptions, UnitFailureMode};

/// Build a batch of nullable string columns
#[must_use]
pub fn string_batch(columns: &[(&str, &[Option<&str>])]) -> RecordBatch {
    let arrays: Vec<(&str, ArrayRef)> = columns
        .iter()
        .map(|(name, values)| {
            let array: ArrayRef = Arc::new(StringArray::from(values.to_vec()));
            (*name, array)
        })
        .collect();
    RecordBatch::try_from_iter(arrays).expect("columns must have equal length")
}

/// Column names of a batch, in order
#[must_use]
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}

/// Values of a string column, nulls as `None`
#[must_use]
pub fn column_values(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let idx = batch
        .schema()
        .index_of(name)
        .unwrap_or_else(|_| panic!("column {name} missing from {:?}", column_names(batch)));
    let array = batch.column(idx).as_string::<i32>();
    (0..array.len())
        .map(|i| (!array.is_null(i)).then(|| array.value(i).to_string()))
        .collect()
}

/// Total rows across batches
#[must_use]
pub fn total_rows(batches: &[RecordBatch]) -> usize {
    batches.iter().map(RecordBatch::num_rows).sum()
}

/// Write `contents` to `dir/name` and return the path
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("failed to write fixture");
    path
}

/// Driver options for tests: no progress bar, no retry sleeps
#[must_use]
pub fn quiet_options(batch_size: usize, failure_mode: UnitFailureMode) -> RunOptions {
    RunOptions {
        batch_size,
        failure_mode,
        max_units: None,
        retry: RetryPolicy::none(),
        show_progress: false,
    }
}

/// File name the catalog looks up first for a period
#[must_use]
pub fn extract_name(year: i32, month: u32) -> String {
    format!("On_Time_Reporting_Carrier_On_Time_Performance_1987_present_{year}_{month}.csv")
}
