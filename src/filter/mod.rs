//! Row filtering for record batches
//!
//! This module provides the expression-based filtering used by the
//! classifiers: an expression is evaluated to a boolean mask once per batch
//! and the mask is applied to every column.

pub mod core;
pub mod expr;

pub use core::{BatchFilter, filter_record_batch};
pub use expr::{Expr, ExpressionFilter, eq_filter, evaluate_expr, fold_value, in_filter};
