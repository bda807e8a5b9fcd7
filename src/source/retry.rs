//! Retry boundary around record sources.
//!
//! Transient read failures are retried here, never inside the pipeline
//! stages. A failed stream is reopened and the batches it already delivered
//! are skipped, so downstream sees each batch once.

use std::io;
use std::thread;

use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::config::RetryPolicy;
use crate::error::{ExtractError, Result};
use crate::source::{BatchStream, RecordSource};

/// Whether `err` may go away if the read is attempted again
///
/// Missing units, bad data and configuration problems are permanent.
#[must_use]
pub fn is_transient(err: &ExtractError) -> bool {
    match err {
        ExtractError::Io(e) | ExtractError::PathIo { source: e, .. } => transient_kind(e),
        ExtractError::Arrow(ArrowError::IoError(_, e)) => transient_kind(e),
        _ => false,
    }
}

fn transient_kind(e: &io::Error) -> bool {
    !matches!(
        e.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::PermissionDenied
            | io::ErrorKind::InvalidData
            | io::ErrorKind::InvalidInput
    )
}

fn into_io(err: ExtractError) -> io::Error {
    match err {
        ExtractError::Io(e)
        | ExtractError::PathIo { source: e, .. }
        | ExtractError::Arrow(ArrowError::IoError(_, e)) => e,
        other => io::Error::other(other.to_string()),
    }
}

/// Open `source` behind the retry boundary
///
/// # Arguments
/// * `source` - The unit to read
/// * `batch_size` - Maximum rows per batch
/// * `policy` - Attempt budget and backoff
///
/// # Returns
/// A stream that transparently reopens `source` after transient failures
///
/// # Errors
/// Returns permanent open errors unchanged and [`ExtractError::TransientIo`]
/// once the attempt budget is spent
pub fn open_with_retry<'a>(
    source: &'a dyn RecordSource,
    batch_size: usize,
    policy: &RetryPolicy,
) -> Result<BatchStream<'a>> {
    let mut stream = ResilientStream {
        source,
        batch_size,
        policy: policy.clone(),
        inner: None,
        delivered: 0,
        skip: 0,
        failures: 0,
        done: false,
    };
    stream.reopen()?;
    Ok(Box::new(stream))
}

/// A batch stream that survives transient read failures
pub struct ResilientStream<'a> {
    source: &'a dyn RecordSource,
    batch_size: usize,
    policy: RetryPolicy,
    inner: Option<BatchStream<'a>>,
    delivered: usize,
    skip: usize,
    failures: u32,
    done: bool,
}

impl ResilientStream<'_> {
    /// Open (or reopen) the inner stream, retrying transient failures
    fn reopen(&mut self) -> Result<()> {
        loop {
            match self.source.open(self.batch_size) {
                Ok(stream) => {
                    self.inner = Some(stream);
                    self.skip = self.delivered;
                    return Ok(());
                }
                Err(e) if is_transient(&e) => self.record_failure(e)?,
                Err(e) => return Err(e),
            }
        }
    }

    /// Count a transient failure; fails once the budget is spent, sleeps otherwise
    fn record_failure(&mut self, err: ExtractError) -> Result<()> {
        self.failures += 1;
        let attempts = self.policy.attempts.max(1);

        if self.failures >= attempts {
            return Err(ExtractError::TransientIo {
                unit: self.source.label(),
                attempts: self.failures,
                source: into_io(err),
            });
        }

        let delay = self.policy.delay_for(self.failures);
        log::warn!(
            "Read of {} failed ({}/{attempts}): {err}; retrying in {delay:?}",
            self.source.label(),
            self.failures
        );
        thread::sleep(delay);
        Ok(())
    }
}

impl Iterator for ResilientStream<'_> {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if self.inner.is_none() {
                if let Err(e) = self.reopen() {
                    self.done = true;
                    return Some(Err(e));
                }
            }

            let next = self.inner.as_mut().and_then(Iterator::next);
            match next {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Ok(_)) if self.skip > 0 => self.skip -= 1,
                Some(Ok(batch)) => {
                    self.delivered += 1;
                    self.failures = 0;
                    return Some(Ok(batch));
                }
                Some(Err(e)) if is_transient(&e) => {
                    self.inner = None;
                    if let Err(e) = self.record_failure(e) {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
