//! Domestic-flight detection.
//!
//! The signal used to decide whether a flight is domestic depends on which
//! endpoint fields a batch carries. The choice is made once per batch from
//! the schema alone, then applied to every row.

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::filter::{BatchFilter, Expr, ExpressionFilter, eq_filter, in_filter};
use crate::schema::{DOMESTIC_COUNTRY_NAME, US_TERRITORY_STATE_ABR, fields};

/// Which endpoint signal a batch offers for domestic detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomesticSignal {
    /// Both country-name fields are present
    CountryName,
    /// Both state-abbreviation fields are present (and no country names)
    StateAbbr,
    /// Neither pair is present; rows are assumed domestic
    NoSignal,
}

impl DomesticSignal {
    /// Pick the signal from the fields present in `schema`
    ///
    /// Country names take priority over state abbreviations. Row values are
    /// never consulted.
    #[must_use]
    pub fn detect(schema: &Schema) -> Self {
        let has = |name: &str| schema.index_of(name).is_ok();

        if has(fields::ORIGIN_COUNTRY_NAME) && has(fields::DEST_COUNTRY_NAME) {
            Self::CountryName
        } else if has(fields::ORIGIN_STATE_ABR) && has(fields::DEST_STATE_ABR) {
            Self::StateAbbr
        } else {
            Self::NoSignal
        }
    }

    /// The row predicate this signal applies
    #[must_use]
    pub fn expr(self, include_territories: bool) -> Expr {
        match self {
            Self::CountryName => Expr::And(vec![
                eq_filter(fields::ORIGIN_COUNTRY_NAME, DOMESTIC_COUNTRY_NAME),
                eq_filter(fields::DEST_COUNTRY_NAME, DOMESTIC_COUNTRY_NAME),
            ]),
            Self::StateAbbr => {
                let mut parts = vec![
                    Expr::IsNotNull(fields::ORIGIN_STATE_ABR.to_string()),
                    Expr::IsNotNull(fields::DEST_STATE_ABR.to_string()),
                ];
                if !include_territories {
                    parts.push(Expr::Not(Box::new(in_filter(
                        fields::ORIGIN_STATE_ABR,
                        US_TERRITORY_STATE_ABR,
                    ))));
                    parts.push(Expr::Not(Box::new(in_filter(
                        fields::DEST_STATE_ABR,
                        US_TERRITORY_STATE_ABR,
                    ))));
                }
                Expr::And(parts)
            }
            Self::NoSignal => Expr::AlwaysTrue,
        }
    }
}

/// Keep only rows whose endpoints are both domestic
///
/// Columns are never changed; only rows are removed.
///
/// # Arguments
/// * `batch` - A reconciled batch
/// * `include_territories` - Whether PR, VI, GU, AS and MP count as domestic
///   when the state-abbreviation signal is used
///
/// # Returns
/// The rows of `batch` classified as domestic, in input order
pub fn classify_domestic(batch: &RecordBatch, include_territories: bool) -> Result<RecordBatch> {
    let signal = DomesticSignal::detect(batch.schema_ref());
    log::trace!("Domestic signal for batch of {} rows: {signal:?}", batch.num_rows());

    if signal == DomesticSignal::NoSignal {
        return Ok(batch.clone());
    }

    ExpressionFilter::new(signal.expr(include_territories)).filter(batch)
}
