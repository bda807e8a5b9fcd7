//! Logging utilities
//!
//! This module provides standardized logging functions for operations.

use std::time::Duration;

/// Log an operation start with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - The unit, file or directory being operated on
pub fn log_operation_start(operation: &str, target: &str) {
    log::info!("{operation} {target}");
}

/// Log an operation completion with consistent format
///
/// # Arguments
/// * `operation` - Description of the operation
/// * `target` - The unit, file or directory that was operated on
/// * `items` - Number of items processed
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, target: &str, items: usize, elapsed: Option<Duration>) {
    if let Some(duration) = elapsed {
        log::info!("Successfully {operation} {items} rows from {target} in {duration:?}");
    } else {
        log::info!("Successfully {operation} {items} rows from {target}");
    }
}

/// Log an operation warning with consistent format
///
/// # Arguments
/// * `message` - Warning message
/// * `unit` - Optional unit related to the warning
pub fn log_warning(message: &str, unit: Option<&str>) {
    if let Some(unit) = unit {
        log::warn!("{unit}: {message}");
    } else {
        log::warn!("{message}");
    }
}
