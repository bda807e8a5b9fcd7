//! Expression-based filtering for string-typed record batches
//!
//! Expressions evaluate to masks without nulls: a null cell never equals a
//! literal and is never a member of a set, so `Not(In(..))` keeps null rows
//! the same way a dataframe `~isin` would.

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Scalar, StringArray};
use arrow::compute::kernels::cast;
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{and, is_not_null, not, prep_null_mask_filter};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::error::{ExtractError, Result};
use crate::filter::core::{BatchFilter, filter_record_batch};

/// Represents a filter expression over string columns
#[derive(Debug, Clone)]
pub enum Expr {
    /// Column equals a literal value (exact, case-sensitive)
    Eq(String, String),

    /// Column is in a set of values (exact, case-sensitive)
    In(String, FxHashSet<String>),

    /// Trimmed, uppercased column value equals the literal
    EqFolded(String, String),

    /// Trimmed, uppercased column value is in the set
    InFolded(String, FxHashSet<String>),

    /// Column is not null
    IsNotNull(String),

    /// Logical AND of expressions
    And(Vec<Expr>),

    /// Logical NOT of an expression
    Not(Box<Expr>),

    /// Always evaluates to true
    AlwaysTrue,
}

/// Fold a value the way [`Expr::EqFolded`] folds column cells
#[must_use]
pub fn fold_value(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Helper function to create an equality expression
#[must_use]
pub fn eq_filter(column: &str, value: &str) -> Expr {
    Expr::Eq(column.to_string(), value.to_string())
}

/// Helper function to create a set-membership expression
#[must_use]
pub fn in_filter<I, S>(column: &str, values: I) -> Expr
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Expr::In(column.to_string(), values.into_iter().map(Into::into).collect())
}

/// Evaluates a filter expression against a record batch
///
/// # Arguments
/// * `batch` - The record batch to evaluate against
/// * `expr` - The expression to evaluate
///
/// # Returns
/// A null-free boolean array indicating which rows match
///
/// # Errors
/// Returns an error if a referenced column is missing or cannot be read as text
pub fn evaluate_expr(batch: &RecordBatch, expr: &Expr) -> Result<BooleanArray> {
    match expr {
        Expr::AlwaysTrue => Ok(BooleanArray::from(vec![true; batch.num_rows()])),

        Expr::Eq(col_name, value) => {
            let column = string_column(batch, col_name)?;
            let literal = Scalar::new(StringArray::from(vec![value.as_str()]));
            let mask = eq(column.as_string::<i32>(), &literal)?;
            if mask.null_count() > 0 {
                Ok(prep_null_mask_filter(&mask))
            } else {
                Ok(mask)
            }
        }

        Expr::In(col_name, values) => {
            let column = string_column(batch, col_name)?;
            Ok(column
                .as_string::<i32>()
                .iter()
                .map(|v| Some(v.is_some_and(|s| values.contains(s))))
                .collect())
        }

        Expr::EqFolded(col_name, value) => {
            let column = string_column(batch, col_name)?;
            Ok(column
                .as_string::<i32>()
                .iter()
                .map(|v| Some(v.is_some_and(|s| fold_value(s) == *value)))
                .collect())
        }

        Expr::InFolded(col_name, values) => {
            let column = string_column(batch, col_name)?;
            Ok(column
                .as_string::<i32>()
                .iter()
                .map(|v| Some(v.is_some_and(|s| values.contains(&fold_value(s)))))
                .collect())
        }

        Expr::IsNotNull(col_name) => {
            let column = column_by_name(batch, col_name)?;
            Ok(is_not_null(column.as_ref())?)
        }

        Expr::And(exprs) => {
            let mut result = BooleanArray::from(vec![true; batch.num_rows()]);
            for expr in exprs {
                let mask = evaluate_expr(batch, expr)?;
                result = and(&result, &mask)?;
            }
            Ok(result)
        }

        Expr::Not(expr) => {
            let mask = evaluate_expr(batch, expr)?;
            Ok(not(&mask)?)
        }
    }
}

fn column_by_name<'a>(batch: &'a RecordBatch, col_name: &str) -> Result<&'a ArrayRef> {
    let schema = batch.schema_ref();
    let idx = schema
        .index_of(col_name)
        .map_err(|_| ExtractError::MissingColumn {
            what: col_name.to_string(),
            available: schema.fields().iter().map(|f| f.name().clone()).collect_vec(),
        })?;
    Ok(batch.column(idx))
}

/// Fetch a column as UTF-8, casting when the source kept another type
fn string_column(batch: &RecordBatch, col_name: &str) -> Result<ArrayRef> {
    let column = column_by_name(batch, col_name)?;
    match column.data_type() {
        DataType::Utf8 => Ok(column.clone()),
        other => {
            log::debug!("Casting column {col_name} from {other:?} to Utf8 for comparison");
            Ok(cast::cast(column, &DataType::Utf8)?)
        }
    }
}

/// A filter that evaluates an expression against a record batch
#[derive(Debug, Clone)]
pub struct ExpressionFilter {
    expr: Expr,
}

impl ExpressionFilter {
    /// Create a new expression filter
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

impl BatchFilter for ExpressionFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mask = evaluate_expr(batch, &self.expr)?;
        filter_record_batch(batch, &mask)
    }
}
