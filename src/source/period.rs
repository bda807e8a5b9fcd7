//! Monthly reporting periods and the on-disk catalog of their extracts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};
use crate::source::{BatchStream, RecordSource, csv, parquet};

/// One calendar month of on-time reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportingPeriod {
    pub year: i32,
    pub month: u32,
}

impl ReportingPeriod {
    /// Create a period, validating the month
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ExtractError::Config(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// All twelve months of each year, years in the given order
    #[must_use]
    pub fn for_years(years: &[i32]) -> Vec<Self> {
        years
            .iter()
            .flat_map(|&year| (1..=12).map(move |month| Self { year, month }))
            .collect()
    }
}

impl fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportingPeriod {
    type Err = ExtractError;

    /// Parse `YYYY-MM` or `YYYYMM`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || ExtractError::Config(format!("invalid reporting period '{s}', expected YYYY-MM"));

        let (year, month) = match s.split_once('-') {
            Some((year, month)) => (year, month),
            None if s.len() == 6 && s.is_ascii() => s.split_at(4),
            None => return Err(invalid()),
        };

        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }

        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

/// File-name stems under which monthly extracts are published
pub const NAME_PATTERNS: [&str; 3] = [
    "On_Time_Reporting_Carrier_On_Time_Performance_1987_present_{year}_{month}",
    "On_Time_Reporting_Carrier_On-Time_Performance_(1987_present)_{year}_{month}",
    "On_Time_Reporting_Carrier_On_Time_Performance_(1987_present)_{year}_{month}",
];

/// Extensions tried for every stem, in order
pub const EXTENSIONS: [&str; 2] = ["csv", "parquet"];

/// A directory holding one extract per reporting period
#[derive(Debug, Clone)]
pub struct PeriodCatalog {
    root: PathBuf,
}

impl PeriodCatalog {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate paths for `period`, in lookup order
    #[must_use]
    pub fn candidates(&self, period: ReportingPeriod) -> Vec<PathBuf> {
        NAME_PATTERNS
            .iter()
            .map(|pattern| {
                pattern
                    .replace("{year}", &period.year.to_string())
                    .replace("{month}", &period.month.to_string())
            })
            .flat_map(|stem| {
                EXTENSIONS
                    .iter()
                    .map(move |ext| self.root.join(format!("{stem}.{ext}")))
            })
            .collect()
    }

    /// Find the extract for `period`
    ///
    /// # Errors
    /// Returns [`ExtractError::SourceUnavailable`] when no candidate exists
    pub fn locate(&self, period: ReportingPeriod) -> Result<PathBuf> {
        self.candidates(period)
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| ExtractError::SourceUnavailable {
                unit: period.to_string(),
                reason: format!("no extract found in {}", self.root.display()),
            })
    }

    /// A lazily-resolved source for `period`
    #[must_use]
    pub fn source(&self, period: ReportingPeriod) -> PeriodSource {
        PeriodSource {
            catalog: self.clone(),
            period,
        }
    }

    /// Sources for every period, in the given order
    #[must_use]
    pub fn sources(&self, periods: &[ReportingPeriod]) -> Vec<PeriodSource> {
        periods.iter().map(|&p| self.source(p)).collect()
    }
}

/// The extract of one reporting period
///
/// The file is located when the source is opened, so a missing month shows
/// up as a skipped unit during the run rather than an error up front.
#[derive(Debug, Clone)]
pub struct PeriodSource {
    catalog: PeriodCatalog,
    period: ReportingPeriod,
}

impl PeriodSource {
    #[must_use]
    pub fn period(&self) -> ReportingPeriod {
        self.period
    }
}

impl RecordSource for PeriodSource {
    fn label(&self) -> String {
        self.period.to_string()
    }

    fn open(&self, batch_size: usize) -> Result<BatchStream<'_>> {
        let path = self.catalog.locate(self.period)?;
        let label = self.label();
        log::info!("Reading {label} from {}", path.display());

        match path.extension().and_then(|e| e.to_str()) {
            Some("parquet") => parquet::stream(&path, &label, batch_size),
            _ => csv::stream(&path, &label, batch_size),
        }
    }
}
