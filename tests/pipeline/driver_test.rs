use std::cell::Cell;
use std::io;

use ontime_extract::schema::fields;
use ontime_extract::sink::RecordSink;
use ontime_extract::source::BatchStream;
use ontime_extract::{
    AliasTable, CancellationToken, CanonicalFieldSet, ClassificationPipeline, ExtractError,
    MemorySink, MemorySource, PipelineOptions, RecordBatch, RecordSource, RunState, UnitFailureMode,
    UnitStatus, run, run_units,
};

use crate::utils::{column_values, quiet_options, string_batch, total_rows};

fn flights(dates: &[&str], carriers: &[&str]) -> RecordBatch {
    let dates: Vec<Option<&str>> = dates.iter().map(|d| Some(*d)).collect();
    let carriers: Vec<Option<&str>> = carriers.iter().map(|c| Some(*c)).collect();
    string_batch(&[("FlightDate", &dates), ("Operating_Airline", &carriers)])
}

fn pipeline_options() -> PipelineOptions {
    PipelineOptions {
        target_code: "AA".to_string(),
        prefer_marketing: false,
        include_territories: true,
        batch_size: 2,
    }
}

/// A source that cancels the run once it has produced `cancel_after` batches
struct CancellingSource {
    token: CancellationToken,
    cancel_after: usize,
    batch: RecordBatch,
    opens: Cell<usize>,
}

impl RecordSource for CancellingSource {
    fn label(&self) -> String {
        "cancelling".to_string()
    }

    fn open(&self, _batch_size: usize) -> ontime_extract::Result<BatchStream<'_>> {
        self.opens.set(self.opens.get() + 1);
        let mut produced = 0;
        Ok(Box::new(std::iter::from_fn(move || {
            produced += 1;
            if produced == self.cancel_after {
                self.token.cancel();
            }
            Some(Ok(self.batch.clone()))
        })))
    }
}

/// A sink whose every append fails
struct BrokenSink;

impl RecordSink for BrokenSink {
    fn append(&mut self, _batch: &RecordBatch, _header_needed: bool) -> ontime_extract::Result<()> {
        Err(io::Error::from(io::ErrorKind::StorageFull).into())
    }
}

/// Output follows source order across batches and units, header requested once
#[test]
fn test_run_units_preserves_order_and_requests_header_once() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());

    let units = vec![
        MemorySource::new(
            "2024-01",
            vec![flights(&["d1", "d2", "d3", "d4", "d5"], &["AA", "DL", "AA", "AA", "UA"])],
        ),
        MemorySource::new("2024-02", vec![flights(&["d6", "d7"], &["UA", "UA"])]),
        MemorySource::new("2024-03", vec![flights(&["d8", "d9"], &["AA", "AA"])]),
    ];

    let mut sink = MemorySink::new();
    let summary = run_units(
        &units,
        &pipeline,
        &mut sink,
        &quiet_options(2, UnitFailureMode::Skip),
        &CancellationToken::new(),
    )?;

    let dates: Vec<Option<String>> = sink
        .batches()
        .iter()
        .flat_map(|b| column_values(b, fields::FL_DATE))
        .collect();
    let expected: Vec<Option<String>> = ["d1", "d3", "d4", "d8", "d9"]
        .iter()
        .map(|d| Some((*d).to_string()))
        .collect();
    assert_eq!(dates, expected);

    assert!(sink.header_flags()[0]);
    assert!(sink.header_flags()[1..].iter().all(|flag| !flag));
    assert!(sink.is_finished());

    assert_eq!(summary.units.len(), 3);
    assert_eq!(summary.contributing_units(), 2);
    assert_eq!(summary.rows_read, 9);
    assert_eq!(summary.rows_written, 5);
    assert_eq!(summary.units[0].batches, 3);
    assert_eq!(summary.units[1].status, UnitStatus::Completed);
    assert_eq!(summary.units[1].rows_written, 0);
    Ok(())
}

/// Batches with no surviving rows never reach the sink
#[test]
fn test_run_skips_empty_results() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());
    let source = MemorySource::new("x", vec![flights(&["d1", "d2", "d3"], &["DL", "DL", "AA"])]);

    let mut sink = MemorySink::new();
    let mut state = RunState::default();
    let report = run(
        &source,
        &pipeline,
        &mut sink,
        &quiet_options(2, UnitFailureMode::Abort),
        &mut state,
        &CancellationToken::new(),
    )?;

    assert_eq!(report.batches, 2);
    assert_eq!(sink.batches().len(), 1);
    assert_eq!(sink.header_flags(), &[true]);
    assert!(state.header_written);
    Ok(())
}

/// A schema failure in one unit is skipped in skip mode and fatal in abort mode
#[test]
fn test_failure_modes() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());

    let no_carrier = string_batch(&[("FlightDate", &[Some("d0")])]);
    let units = vec![
        MemorySource::new("good-1", vec![flights(&["d1"], &["AA"])]),
        MemorySource::new("bad", vec![no_carrier]),
        MemorySource::new("good-2", vec![flights(&["d2"], &["AA"])]),
    ];

    let mut sink = MemorySink::new();
    let summary = run_units(
        &units,
        &pipeline,
        &mut sink,
        &quiet_options(10, UnitFailureMode::Skip),
        &CancellationToken::new(),
    )?;
    assert_eq!(summary.units[1].status, UnitStatus::Failed);
    assert!(summary.units[1].error.as_deref().unwrap_or_default().contains("Schema error"));
    assert_eq!(summary.contributing_units(), 2);
    assert_eq!(total_rows(sink.batches()), 2);

    let mut sink = MemorySink::new();
    let err = run_units(
        &units,
        &pipeline,
        &mut sink,
        &quiet_options(10, UnitFailureMode::Abort),
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ExtractError::Schema { .. }));
    // The unit before the failure was already written
    assert_eq!(total_rows(sink.batches()), 1);
    Ok(())
}

/// Missing units are skipped even in abort mode
#[test]
fn test_unavailable_unit_is_skipped_in_abort_mode() -> ontime_extract::Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());

    let units: Vec<Box<dyn RecordSource>> = vec![
        Box::new(ontime_extract::CsvFileSource::new(dir.path().join("missing.csv"))),
        Box::new(MemorySource::new("present", vec![flights(&["d1"], &["AA"])])),
    ];

    let mut sink = MemorySink::new();
    let summary = run_units(
        &units,
        &pipeline,
        &mut sink,
        &quiet_options(10, UnitFailureMode::Abort),
        &CancellationToken::new(),
    )?;

    assert_eq!(summary.units[0].status, UnitStatus::Skipped);
    assert_eq!(summary.units[1].status, UnitStatus::Completed);
    assert_eq!(summary.contributing_units(), 1);
    Ok(())
}

/// Zero contributing units is reported as an empty result
#[test]
fn test_no_output_is_empty_result() {
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());
    let units = vec![
        MemorySource::new("a", vec![flights(&["d1"], &["DL"])]),
        MemorySource::new("b", Vec::new()),
    ];

    let err = run_units(
        &units,
        &pipeline,
        &mut MemorySink::new(),
        &quiet_options(10, UnitFailureMode::Skip),
        &CancellationToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, ExtractError::EmptyResult { units: 2 }));
}

/// Cancellation is honoured between batches of an endless source
#[test]
fn test_cancellation_between_batches() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());
    let token = CancellationToken::new();

    let units = vec![
        CancellingSource {
            token: token.clone(),
            cancel_after: 3,
            batch: flights(&["d1", "d2"], &["AA", "AA"]),
            opens: Cell::new(0),
        },
        CancellingSource {
            token: token.clone(),
            cancel_after: 1,
            batch: flights(&["d3"], &["AA"]),
            opens: Cell::new(0),
        },
    ];

    let mut sink = MemorySink::new();
    let summary = run_units(
        &units,
        &pipeline,
        &mut sink,
        &quiet_options(2, UnitFailureMode::Skip),
        &token,
    )?;

    assert!(summary.cancelled);
    assert_eq!(summary.units.len(), 1);
    assert_eq!(summary.units[0].status, UnitStatus::Cancelled);
    assert_eq!(summary.units[0].batches, 3);
    assert_eq!(sink.batches().len(), 3);
    assert_eq!(units[1].opens.get(), 0);
    Ok(())
}

/// Only the first `max_units` units are read
#[test]
fn test_max_units_limits_run() -> ontime_extract::Result<()> {
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());
    let units: Vec<MemorySource> = (0..4)
        .map(|i| MemorySource::new(format!("u{i}"), vec![flights(&["d"], &["AA"])]))
        .collect();

    let mut options = quiet_options(10, UnitFailureMode::Skip);
    options.max_units = Some(2);
    let summary = run_units(
        &units,
        &pipeline,
        &mut MemorySink::new(),
        &options,
        &CancellationToken::new(),
    )?;

    assert_eq!(summary.units.len(), 2);
    assert!(!summary.cancelled);
    Ok(())
}

/// Sink failures end the run whatever the failure mode
#[test]
fn test_sink_failure_is_fatal() {
    let table = AliasTable::on_time_reporting();
    let fields_set = CanonicalFieldSet::default();
    let pipeline = ClassificationPipeline::new(&table, &fields_set, pipeline_options());
    let units = vec![
        MemorySource::new("a", vec![flights(&["d1"], &["AA"])]),
        MemorySource::new("b", vec![flights(&["d2"], &["AA"])]),
    ];

    let err = run_units(
        &units,
        &pipeline,
        &mut BrokenSink,
        &quiet_options(10, UnitFailureMode::Skip),
        &CancellationToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, ExtractError::Sink(_)));
}
