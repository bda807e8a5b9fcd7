//! Alias table mapping canonical field names to accepted source spellings.

use std::path::Path;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{ExtractError, Result};
use crate::error::util::safe_read_to_string;
use crate::schema::fields;
use crate::schema::normalize::normalize_key;

/// One canonical field and the source spellings accepted for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl AliasEntry {
    pub fn new(canonical: &str, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.to_string(),
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// An alias entry with its normalized keys precomputed
#[derive(Debug, Clone)]
pub(crate) struct ResolvedEntry {
    pub(crate) canonical: String,
    /// Normalized alias keys in declared order, without duplicates
    pub(crate) keys: SmallVec<[String; 8]>,
}

impl ResolvedEntry {
    fn from_entry(entry: AliasEntry) -> Self {
        let mut keys: SmallVec<[String; 8]> = SmallVec::new();
        for alias in entry.aliases.iter().chain(std::iter::once(&entry.canonical)) {
            let key = normalize_key(alias);
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        Self {
            canonical: entry.canonical,
            keys,
        }
    }
}

/// Immutable alias table, built once at startup and passed to every stage
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<ResolvedEntry>,
}

impl AliasTable {
    /// Build a table from entries in priority order
    ///
    /// The canonical name is always accepted as an alias of itself; it is
    /// appended to the alias list when the entry does not declare it.
    ///
    /// # Errors
    /// Returns a configuration error on empty or duplicated canonical names.
    pub fn new(entries: Vec<AliasEntry>) -> Result<Self> {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut resolved = Vec::with_capacity(entries.len());

        for entry in entries {
            if normalize_key(&entry.canonical).is_empty() {
                return Err(ExtractError::Config(format!(
                    "alias table entry has an empty canonical name: {:?}",
                    entry.canonical
                )));
            }
            if !seen.insert(entry.canonical.clone()) {
                return Err(ExtractError::Config(format!(
                    "canonical field {} declared twice in alias table",
                    entry.canonical
                )));
            }

            resolved.push(ResolvedEntry::from_entry(entry));
        }

        Ok(Self { entries: resolved })
    }

    /// Parse a table from JSON: `[{"canonical": "...", "aliases": ["..."]}, ...]`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: Vec<AliasEntry> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Load a table from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = safe_read_to_string(path, "alias table")?;
        let table = Self::from_json_str(&content)?;
        log::info!(
            "Loaded alias table with {} canonical fields from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    /// Canonical names in priority order
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.canonical.as_str())
    }

    pub(crate) fn entries(&self) -> &[ResolvedEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The built-in table covering the BTS on-time reporting vintages
    #[must_use]
    pub fn on_time_reporting() -> Self {
        Self {
            entries: default_entries()
                .into_iter()
                .map(ResolvedEntry::from_entry)
                .collect(),
        }
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::on_time_reporting()
    }
}

/// Built-in alias entries
#[must_use]
pub fn default_entries() -> Vec<AliasEntry> {
    vec![
        AliasEntry::new(fields::FL_DATE, &["FL_DATE", "FLIGHT_DATE", "FLIGHTDATE"]),
        AliasEntry::new(
            fields::OP_UNIQUE_CARRIER,
            &[
                "OP_UNIQUE_CARRIER",
                "OPERATING_AIRLINE",
                "OPERATINGCARRIER",
                "OP_CARRIER",
                "OPERATING_AIRLINE_IATA_CODE",
                "OPERATINGAIRLINEIATACODE",
            ],
        ),
        // Reporting carrier columns of the "On_Time_Reporting_Carrier" exports land here
        AliasEntry::new(
            fields::MKT_UNIQUE_CARRIER,
            &[
                "MKT_UNIQUE_CARRIER",
                "MARKETING_AIRLINE_NETWORK",
                "MARKETINGCARRIER",
                "MKT_CARRIER",
                "MKTUNIQUECARRIER",
                "REPORTING_AIRLINE",
                "IATA_CODE_REPORTING_AIRLINE",
            ],
        ),
        AliasEntry::new(
            fields::OP_CARRIER_FL_NUM,
            &[
                "OP_CARRIER_FL_NUM",
                "OP_CARRIER_FLNUM",
                "FL_NUM",
                "FLIGHT_NUM",
                "FLIGHT_NUMBER",
                "FLIGHT_NUMBER_REPORTING_AIRLINE",
                "FLIGHT_NUMBER_OPERATING_AIRLINE",
                "FLIGHT_NUMBER_REPORTINGAIRLINE",
                "FLIGHT_NUMBER_OPERATINGAIRLINE",
            ],
        ),
        AliasEntry::new(fields::ORIGIN, &["ORIGIN", "ORIGINAIRPORT", "ORIGIN_AIRPORT"]),
        AliasEntry::new(fields::DEST, &["DEST", "DESTAIRPORT", "DEST_AIRPORT"]),
        AliasEntry::new(
            fields::ORIGIN_STATE_ABR,
            &[
                "ORIGIN_STATE_ABR",
                "ORIGIN_STATE_ABBREVIATION",
                "ORIGINSTATE",
                "ORIGIN_STATE",
            ],
        ),
        AliasEntry::new(
            fields::DEST_STATE_ABR,
            &[
                "DEST_STATE_ABR",
                "DEST_STATE_ABBREVIATION",
                "DESTSTATE",
                "DEST_STATE",
            ],
        ),
        AliasEntry::new(
            fields::ORIGIN_COUNTRY_NAME,
            &["ORIGIN_COUNTRY_NAME", "ORIGINCOUNTRYNAME", "ORIGIN_COUNTRY"],
        ),
        AliasEntry::new(
            fields::DEST_COUNTRY_NAME,
            &["DEST_COUNTRY_NAME", "DESTCOUNTRYNAME", "DEST_COUNTRY"],
        ),
        AliasEntry::new(fields::CRS_DEP_TIME, &["CRS_DEP_TIME", "CRSDEPTIME"]),
        AliasEntry::new(fields::DEP_TIME, &["DEP_TIME", "DEPTIME"]),
        AliasEntry::new(fields::WHEELS_OFF, &["WHEELS_OFF", "WHEELSOFF"]),
        AliasEntry::new(fields::CRS_ARR_TIME, &["CRS_ARR_TIME", "CRSARRTIME"]),
        AliasEntry::new(fields::ARR_TIME, &["ARR_TIME", "ARRTIME"]),
        AliasEntry::new(fields::WHEELS_ON, &["WHEELS_ON", "WHEELSON"]),
        AliasEntry::new(fields::CANCELLED, &["CANCELLED", "CANCELLED_"]),
        AliasEntry::new(fields::DIVERTED, &["DIVERTED", "DIVERTED_"]),
    ]
}
