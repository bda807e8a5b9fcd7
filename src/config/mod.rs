//! Configuration for extract runs.

use std::time::Duration;

use crate::error::{ExtractError, Result};

/// Default number of rows per batch
pub const DEFAULT_BATCH_SIZE: usize = 300_000;

/// Default number of rows per batch for the airport route filter
pub const DEFAULT_FILTER_BATCH_SIZE: usize = 200_000;

/// Environment variable overriding the batch size
pub const BATCH_SIZE_ENV: &str = "ONTIME_BATCH_SIZE";

/// Default carrier code to keep
pub const DEFAULT_CARRIER: &str = "AA";

/// Helper function to get batch size from environment
#[must_use]
pub fn get_batch_size() -> Option<usize> {
    std::env::var(BATCH_SIZE_ENV)
        .ok()
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

/// How often, and how patiently, a unit's reads are retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per failure point, including the first
    pub attempts: u32,
    /// Delay after the first failure; later delays grow linearly
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retrying after the `attempt`-th failure
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// A policy that tries once and never sleeps
    #[must_use]
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(1500),
        }
    }
}

/// What a run does when one unit fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitFailureMode {
    /// Warn and continue with the next unit
    #[default]
    Skip,
    /// Stop the run on the first failing unit
    Abort,
}

/// Configuration for an extract run
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Carrier code rows must match
    pub carrier: String,
    /// Filter on the marketing carrier instead of the operating carrier
    pub prefer_marketing: bool,
    /// Count US territories as domestic
    pub include_territories: bool,
    /// Maximum rows per batch
    pub batch_size: usize,
    /// Retry policy at the source boundary
    pub retry: RetryPolicy,
    /// Reaction to a failing unit
    pub failure_mode: UnitFailureMode,
    /// Stop after this many units
    pub max_units: Option<usize>,
    /// Draw a progress bar
    pub show_progress: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            carrier: DEFAULT_CARRIER.to_string(),
            prefer_marketing: false,
            include_territories: true,
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            failure_mode: UnitFailureMode::Skip,
            max_units: None,
            show_progress: true,
        }
    }
}

impl ExtractConfig {
    /// Defaults with environment overrides applied
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(batch_size) = get_batch_size() {
            log::debug!("Batch size {batch_size} taken from {BATCH_SIZE_ENV}");
            config.batch_size = batch_size;
        }
        config
    }

    #[must_use]
    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_failure_mode(mut self, mode: UnitFailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Check values that would otherwise fail deep inside a run
    pub fn validate(&self) -> Result<()> {
        if self.carrier.trim().is_empty() {
            return Err(ExtractError::Config("carrier code must not be empty".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ExtractError::Config("batch size must be positive".to_string()));
        }
        if self.retry.attempts == 0 {
            return Err(ExtractError::Config("retry attempts must be at least 1".to_string()));
        }
        if self.max_units == Some(0) {
            return Err(ExtractError::Config("max units must be at least 1".to_string()));
        }
        Ok(())
    }
}
