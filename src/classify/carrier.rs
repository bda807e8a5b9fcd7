//! Carrier selection.
//!
//! A record belongs to the target carrier when its operating or marketing
//! carrier code equals the target. Which of the two fields is consulted is
//! decided once per batch.

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::error::{CarrierKind, ExtractError, Result};
use crate::filter::{BatchFilter, ExpressionFilter, eq_filter};
use crate::schema::fields;

/// The carrier field a batch will be filtered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierResolution {
    /// The preferred field is present
    Preferred(&'static str),
    /// The preferred field is absent, the other carrier field is used
    Fallback(&'static str),
    /// Neither carrier field is present
    Unresolvable,
}

impl CarrierResolution {
    /// Resolve the carrier field from the fields present in `schema`
    #[must_use]
    pub fn resolve(schema: &Schema, prefer_marketing: bool) -> Self {
        let (preferred, other) = carrier_fields(prefer_marketing);
        let has = |name: &str| schema.index_of(name).is_ok();

        if has(preferred) {
            Self::Preferred(preferred)
        } else if has(other) {
            Self::Fallback(other)
        } else {
            Self::Unresolvable
        }
    }

    /// The resolved column name, if any
    #[must_use]
    pub fn field(self) -> Option<&'static str> {
        match self {
            Self::Preferred(field) | Self::Fallback(field) => Some(field),
            Self::Unresolvable => None,
        }
    }
}

fn carrier_fields(prefer_marketing: bool) -> (&'static str, &'static str) {
    if prefer_marketing {
        (fields::MKT_UNIQUE_CARRIER, fields::OP_UNIQUE_CARRIER)
    } else {
        (fields::OP_UNIQUE_CARRIER, fields::MKT_UNIQUE_CARRIER)
    }
}

/// Keep rows whose carrier code equals `target_code`
///
/// Comparison is exact: codes are expected to be uppercase IATA designators
/// already, and nulls never match.
///
/// # Errors
/// Returns [`ExtractError::Schema`] when the batch has neither carrier field,
/// whatever its rows contain
pub fn select_carrier(
    batch: &RecordBatch,
    target_code: &str,
    prefer_marketing: bool,
) -> Result<RecordBatch> {
    let resolution = CarrierResolution::resolve(batch.schema_ref(), prefer_marketing);

    let Some(field) = resolution.field() else {
        let kind = if prefer_marketing {
            CarrierKind::Marketing
        } else {
            CarrierKind::Operating
        };
        return Err(ExtractError::Schema {
            kind,
            available: batch
                .schema_ref()
                .fields()
                .iter()
                .map(|f| f.name().clone())
                .collect_vec(),
        });
    };

    if let CarrierResolution::Fallback(field) = resolution {
        log::debug!("Preferred carrier field absent, filtering on {field}");
    }

    ExpressionFilter::new(eq_filter(field, target_code)).filter(batch)
}
