//! Route filter over a fixed airport set.
//!
//! Used on already-extracted output to keep one carrier's flights between a
//! chosen set of airports. Unlike the classification pipeline it keeps every
//! input column and compares trimmed, uppercased values.

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::error::{ExtractError, Result};
use crate::filter::{BatchFilter, Expr, ExpressionFilter, fold_value};
use crate::pipeline::BatchTransform;

/// Airports kept when none are given
pub const DEFAULT_AIRPORTS: [&str; 10] = [
    "DFW", "LGA", "JFK", "PHL", "DCA", "CLT", "MIA", "ORD", "PHX", "LAX",
];

/// Carrier column candidates, in lookup order
pub const CARRIER_CANDIDATES: [&str; 5] = [
    "UNIQUE_CARRIER",
    "OP_UNIQUE_CARRIER",
    "MKT_UNIQUE_CARRIER",
    "REPORTING_AIRLINE",
    "CARRIER",
];

/// Origin column candidates, in lookup order
pub const ORIGIN_CANDIDATES: [&str; 4] = [
    "ORIGIN",
    "ORIGIN_AIRPORT",
    "ORIGIN_AIRPORT_ID",
    "ORIGIN_AIRPORT_SEQ_ID",
];

/// Destination column candidates, in lookup order
pub const DEST_CANDIDATES: [&str; 4] = [
    "DEST",
    "DEST_AIRPORT",
    "DEST_AIRPORT_ID",
    "DEST_AIRPORT_SEQ_ID",
];

/// Find the first candidate present in `schema`, ignoring case
///
/// Returns the column's actual spelling.
#[must_use]
pub fn pick_column(schema: &Schema, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|candidate| {
        schema
            .fields()
            .iter()
            .find(|f| f.name().eq_ignore_ascii_case(candidate))
            .map(|f| f.name().clone())
    })
}

/// Keeps a carrier's flights whose origin and destination are both in a set
#[derive(Debug, Clone)]
pub struct AirportFilter {
    carrier: String,
    airports: FxHashSet<String>,
}

impl AirportFilter {
    /// Create a filter; codes are trimmed and uppercased
    #[must_use]
    pub fn new<I, S>(carrier: &str, airports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            carrier: fold_value(carrier),
            airports: airports
                .into_iter()
                .map(|a| fold_value(a.as_ref()))
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    #[must_use]
    pub fn carrier(&self) -> &str {
        &self.carrier
    }

    #[must_use]
    pub fn airports(&self) -> &FxHashSet<String> {
        &self.airports
    }

    fn build_expr(&self, schema: &Schema) -> Result<Expr> {
        let available = || schema.fields().iter().map(|f| f.name().clone()).collect_vec();

        let carrier_col =
            pick_column(schema, &CARRIER_CANDIDATES).ok_or_else(|| ExtractError::MissingColumn {
                what: "carrier".to_string(),
                available: available(),
            })?;
        let (Some(origin_col), Some(dest_col)) = (
            pick_column(schema, &ORIGIN_CANDIDATES),
            pick_column(schema, &DEST_CANDIDATES),
        ) else {
            return Err(ExtractError::MissingColumn {
                what: "origin/destination".to_string(),
                available: available(),
            });
        };

        Ok(Expr::And(vec![
            Expr::EqFolded(carrier_col, self.carrier.clone()),
            Expr::InFolded(origin_col, self.airports.clone()),
            Expr::InFolded(dest_col, self.airports.clone()),
        ]))
    }
}

impl Default for AirportFilter {
    fn default() -> Self {
        Self::new("AA", DEFAULT_AIRPORTS)
    }
}

impl BatchFilter for AirportFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let expr = self.build_expr(batch.schema_ref())?;
        ExpressionFilter::new(expr).filter(batch)
    }
}

impl BatchTransform for AirportFilter {
    fn transform(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        self.filter(batch)
    }
}
