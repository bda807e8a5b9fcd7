//! Canonical schema for on-time flight extracts.
//!
//! Monthly extracts from different vintages spell the same field in many ways
//! (`FlightDate`, `FL_DATE`, `Flight_Date`...). This module owns the canonical
//! vocabulary, the alias table that maps source spellings onto it, and the
//! batch-level operations that apply that mapping:
//!
//! - [`normalize`]: column-name normalization and alias resolution
//! - [`reconcile`]: renaming a batch's columns to canonical names
//! - [`projection`]: reducing a batch to the canonical output fields
//! - [`adapt`]: string-typing and header alignment of batches

pub mod adapt;
pub mod aliases;
pub mod normalize;
pub mod projection;
pub mod reconcile;

pub use aliases::{AliasEntry, AliasTable};
pub use normalize::{Binding, ColumnBinding, normalize_key, resolve};
pub use projection::{empty_batch, project};
pub use reconcile::reconcile;

/// Canonical field names
pub mod fields {
    pub const FL_DATE: &str = "FL_DATE";
    pub const OP_UNIQUE_CARRIER: &str = "OP_UNIQUE_CARRIER";
    pub const MKT_UNIQUE_CARRIER: &str = "MKT_UNIQUE_CARRIER";
    pub const OP_CARRIER_FL_NUM: &str = "OP_CARRIER_FL_NUM";
    pub const ORIGIN: &str = "ORIGIN";
    pub const DEST: &str = "DEST";
    pub const ORIGIN_STATE_ABR: &str = "ORIGIN_STATE_ABR";
    pub const DEST_STATE_ABR: &str = "DEST_STATE_ABR";
    pub const ORIGIN_COUNTRY_NAME: &str = "ORIGIN_COUNTRY_NAME";
    pub const DEST_COUNTRY_NAME: &str = "DEST_COUNTRY_NAME";
    pub const CRS_DEP_TIME: &str = "CRS_DEP_TIME";
    pub const DEP_TIME: &str = "DEP_TIME";
    pub const WHEELS_OFF: &str = "WHEELS_OFF";
    pub const CRS_ARR_TIME: &str = "CRS_ARR_TIME";
    pub const ARR_TIME: &str = "ARR_TIME";
    pub const WHEELS_ON: &str = "WHEELS_ON";
    pub const CANCELLED: &str = "CANCELLED";
    pub const DIVERTED: &str = "DIVERTED";
}

/// Output fields, in output order
pub const CANONICAL_OUTPUT_FIELDS: [&str; 14] = [
    fields::FL_DATE,
    fields::OP_UNIQUE_CARRIER,
    fields::MKT_UNIQUE_CARRIER,
    fields::OP_CARRIER_FL_NUM,
    fields::ORIGIN,
    fields::DEST,
    fields::CRS_DEP_TIME,
    fields::DEP_TIME,
    fields::WHEELS_OFF,
    fields::CRS_ARR_TIME,
    fields::ARR_TIME,
    fields::WHEELS_ON,
    fields::CANCELLED,
    fields::DIVERTED,
];

/// State abbreviations of US territories
pub const US_TERRITORY_STATE_ABR: [&str; 5] = ["PR", "VI", "GU", "AS", "MP"];

/// Country name both endpoints must carry to count as domestic
pub const DOMESTIC_COUNTRY_NAME: &str = "UNITED STATES";

/// The ordered set of fields a projected batch may contain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalFieldSet {
    fields: Vec<String>,
}

impl CanonicalFieldSet {
    /// Create a field set from an ordered list of names
    #[must_use]
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = rustc_hash::FxHashSet::default();
        let fields = fields
            .into_iter()
            .map(Into::into)
            .filter(|f: &String| seen.insert(f.clone()))
            .collect();
        Self { fields }
    }

    /// Field names in output order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for CanonicalFieldSet {
    fn default() -> Self {
        Self::new(CANONICAL_OUTPUT_FIELDS)
    }
}
