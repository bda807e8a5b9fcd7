//! Chunked driver: pulls batches from sources, transforms them one at a time
//! and appends the results to a sink.
//!
//! At most one source batch and its transformed result are alive at any
//! point, so memory stays bounded by the batch size however long the input
//! is. The only state carried between batches and units is whether the
//! output header has been written.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;

use crate::config::{ExtractConfig, RetryPolicy, UnitFailureMode};
use crate::error::{ExtractError, Result};
use crate::pipeline::BatchTransform;
use crate::sink::RecordSink;
use crate::source::{RecordSource, open_with_retry};
use crate::utils::logging::{
    create_run_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
    log_warning,
};

/// Shared flag used to stop a run between batches
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; takes effect before the next batch pull
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Cross-unit state of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// Set by the first non-empty append, never cleared
    pub header_written: bool,
}

/// Outcome of one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// The unit was read to the end
    Completed,
    /// The unit could not be obtained and was skipped
    Skipped,
    /// The unit failed part way; rows appended before the failure remain
    Failed,
    /// The run was cancelled while reading the unit
    Cancelled,
}

/// Per-unit counters and outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitReport {
    pub unit: String,
    pub status: UnitStatus,
    pub batches: usize,
    pub rows_read: usize,
    pub rows_written: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UnitReport {
    #[must_use]
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            status: UnitStatus::Completed,
            batches: 0,
            rows_read: 0,
            rows_written: 0,
            error: None,
        }
    }

    /// Whether the unit appended any rows
    #[must_use]
    pub fn contributed(&self) -> bool {
        self.rows_written > 0
    }
}

/// Summary of a run over many units
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub units: Vec<UnitReport>,
    pub rows_read: usize,
    pub rows_written: usize,
    pub cancelled: bool,
}

impl RunSummary {
    fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            elapsed_ms: 0,
            units: Vec::new(),
            rows_read: 0,
            rows_written: 0,
            cancelled: false,
        }
    }

    fn push(&mut self, report: UnitReport) {
        self.rows_read += report.rows_read;
        self.rows_written += report.rows_written;
        self.units.push(report);
    }

    /// Number of units that appended rows
    #[must_use]
    pub fn contributing_units(&self) -> usize {
        self.units.iter().filter(|u| u.contributed()).count()
    }

    /// Units with the given status
    pub fn with_status(&self, status: UnitStatus) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(move |u| u.status == status)
    }

    /// Pretty-printed JSON form
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Driver settings
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum rows per batch pulled from a source
    pub batch_size: usize,
    /// Reaction to a failing unit
    pub failure_mode: UnitFailureMode,
    /// Stop after this many units
    pub max_units: Option<usize>,
    /// Retry policy applied when opening and reading sources
    pub retry: RetryPolicy,
    /// Draw a progress bar over units
    pub show_progress: bool,
}

impl From<&ExtractConfig> for RunOptions {
    fn from(config: &ExtractConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            failure_mode: config.failure_mode,
            max_units: config.max_units,
            retry: config.retry.clone(),
            show_progress: config.show_progress,
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&ExtractConfig::default())
    }
}

/// Drive a single source through `transform` into `sink`
///
/// # Arguments
/// * `source` - The unit to read
/// * `transform` - Applied to every batch independently
/// * `sink` - Receives every non-empty transformed batch, in source order
/// * `options` - Batch size and retry policy
/// * `state` - Header state shared with other units of the same run
/// * `cancel` - Checked before every batch pull
///
/// # Returns
/// The unit's counters; `status` is `Cancelled` if the run was stopped
///
/// # Errors
/// Returns the first source, transform or sink error. Rows appended before
/// the error stay in the sink. The sink is not finished; that is left to
/// the caller.
pub fn run(
    source: &dyn RecordSource,
    transform: &dyn BatchTransform,
    sink: &mut dyn RecordSink,
    options: &RunOptions,
    state: &mut RunState,
    cancel: &CancellationToken,
) -> Result<UnitReport> {
    let mut report = UnitReport::new(source.label());
    drive_unit(
        source,
        transform,
        sink,
        options,
        state,
        cancel,
        &ProgressBar::hidden(),
        &mut report,
    )?;
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn drive_unit(
    source: &dyn RecordSource,
    transform: &dyn BatchTransform,
    sink: &mut dyn RecordSink,
    options: &RunOptions,
    state: &mut RunState,
    cancel: &CancellationToken,
    pb: &ProgressBar,
    report: &mut UnitReport,
) -> Result<()> {
    let mut stream = open_with_retry(source, options.batch_size, &options.retry)?;

    loop {
        if cancel.is_cancelled() {
            report.status = UnitStatus::Cancelled;
            return Ok(());
        }

        let Some(batch) = stream.next() else {
            return Ok(());
        };
        let batch = batch?;
        report.batches += 1;
        report.rows_read += batch.num_rows();

        let out = transform.transform(&batch)?;
        drop(batch);

        if out.num_rows() > 0 {
            sink.append(&out, !state.header_written)
                .map_err(|e| ExtractError::Sink(Box::new(e)))?;
            state.header_written = true;
            report.rows_written += out.num_rows();
        }

        pb.set_message(format!("{} ({} batches)", report.unit, report.batches));
    }
}

/// Drive many units into one sink, sharing a single header
///
/// Missing units are always skipped with a warning. Other unit failures are
/// skipped or abort the run according to `options.failure_mode`; sink
/// failures always abort. Cancellation ends the run early with a partial
/// summary. The sink is finished on every path except a sink failure, so
/// rows appended before an abort are kept.
///
/// # Errors
/// Returns [`ExtractError::EmptyResult`] when no unit appended a row, the
/// failing unit's error in abort mode, or a sink error
pub fn run_units<S: RecordSource>(
    units: &[S],
    transform: &dyn BatchTransform,
    sink: &mut dyn RecordSink,
    options: &RunOptions,
    cancel: &CancellationToken,
) -> Result<RunSummary> {
    let start = Instant::now();
    let mut summary = RunSummary::new(Utc::now());
    let mut state = RunState::default();

    let limit = options.max_units.map_or(units.len(), |n| n.min(units.len()));
    let pb = create_run_progress_bar(limit as u64, Some("Extracting"), options.show_progress);

    for source in &units[..limit] {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }

        let mut report = UnitReport::new(source.label());
        let unit_start = Instant::now();
        log_operation_start("Processing", &report.unit);

        let outcome = drive_unit(
            source,
            transform,
            sink,
            options,
            &mut state,
            cancel,
            &pb,
            &mut report,
        );

        match outcome {
            Ok(()) if report.status == UnitStatus::Cancelled => {
                log::info!("Run cancelled while reading {}", report.unit);
                summary.cancelled = true;
                summary.push(report);
                break;
            }
            Ok(()) => {
                if report.contributed() {
                    log_operation_complete(
                        "wrote",
                        &report.unit,
                        report.rows_written,
                        Some(unit_start.elapsed()),
                    );
                } else {
                    log::info!("{}: no matching rows in {} batches", report.unit, report.batches);
                }
            }
            Err(e @ ExtractError::Sink(_)) => {
                pb.abandon();
                log::error!("Writing output failed during {}: {e}", report.unit);
                return Err(e);
            }
            Err(e) if e.is_soft() => {
                report.status = UnitStatus::Skipped;
                log_warning(&format!("skipped: {e}"), Some(&report.unit));
                report.error = Some(e.to_string());
            }
            Err(e) if options.failure_mode == UnitFailureMode::Skip => {
                report.status = UnitStatus::Failed;
                log_warning(&format!("skipped: {e}"), Some(&report.unit));
                report.error = Some(e.to_string());
            }
            Err(e) => {
                pb.abandon();
                log::error!("{} failed, aborting run: {e}", report.unit);
                if let Err(finish_err) = sink.finish() {
                    log::error!("Could not finish output after abort: {finish_err}");
                }
                return Err(e);
            }
        }

        summary.push(report);
        pb.inc(1);
    }

    if !summary.cancelled && limit < units.len() {
        log::info!("Stopped after {limit} of {} units", units.len());
    }

    sink.finish().map_err(|e| ExtractError::Sink(Box::new(e)))?;
    finish_progress_bar(&pb, Some("done"));
    summary.elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    if summary.contributing_units() == 0 {
        log::error!(
            "No data collected from {} unit(s); check the catalog and alias table",
            summary.units.len()
        );
        return Err(ExtractError::EmptyResult {
            units: summary.units.len(),
        });
    }

    log::info!(
        "Wrote {} of {} rows from {} of {} units in {:?}",
        summary.rows_written,
        summary.rows_read,
        summary.contributing_units(),
        summary.units.len(),
        start.elapsed()
    );
    Ok(summary)
}
