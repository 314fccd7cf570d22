use chrono::{Datelike, NaiveDate};
use tracing::warn;

use crate::error::{Error, Result};

/// First year covered by the ERA5 back extension.
pub const FIRST_YEAR: i32 = 1950;

/// First year covered by the main ERA5 datasets.
pub const MAIN_FIRST_YEAR: i32 = 1979;

pub fn yyyymmdd(date: &NaiveDate) -> String {
    format!("{:04}{:02}{:02}", date.year(), date.month(), date.day())
}

pub fn iso(date: &NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Parse "YYYYMMDD" or "YYYY-MM-DD".
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.len() == 8 && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(trimmed, "%Y%m%d")
            .map_err(|_| Error::InvalidRequest(format!("invalid YYYYMMDD date: {trimmed}")));
    }

    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(d);
    }

    Err(Error::InvalidRequest(format!(
        "unsupported date format: {trimmed}"
    )))
}

/// Inclusive start/end pair, always ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Normalize a list of dates: one value is used for both ends,
    /// two values are ordered, anything past the second is ignored.
    pub fn from_dates(dates: &[NaiveDate]) -> Result<Self> {
        match dates {
            [] => Err(Error::InvalidRequest(
                "missing mandatory argument: date".into(),
            )),
            [only] => {
                warn!("using same date for date_start and date_end");
                Ok(Self {
                    start: *only,
                    end: *only,
                })
            }
            [start, end, rest @ ..] => {
                if !rest.is_empty() {
                    warn!(ignored = rest.len(), "more than two dates given, using the first two");
                }
                if start > end {
                    warn!(%start, %end, "date_start > date_end, swapping dates");
                    Ok(Self {
                        start: *end,
                        end: *start,
                    })
                } else {
                    Ok(Self {
                        start: *start,
                        end: *end,
                    })
                }
            }
        }
    }

    pub fn parse<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        let dates = values
            .iter()
            .map(|v| parse_date(v.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Self::from_dates(&dates)
    }

    /// Whether the preliminary back extension (1950-1978) is needed.
    ///
    /// Only the start date is considered. Years before 1950 are rejected.
    pub fn needs_back_extension(&self) -> Result<bool> {
        let year = self.start.year();
        if year < FIRST_YEAR {
            return Err(Error::NoDataAvailable(year));
        }
        if year < MAIN_FIRST_YEAR {
            warn!(year, "requesting ERA5 back extension 1950-1978 (preliminary version)");
            return Ok(true);
        }
        Ok(false)
    }

    /// `YYYYMMDD-YYYYMMDD`, as used in output file names.
    pub fn compact(&self) -> String {
        format!("{}-{}", yyyymmdd(&self.start), yyyymmdd(&self.end))
    }
}

/// Analysis hours 0..24 spaced by `step`.
pub fn hours(step: u32) -> Vec<u32> {
    (0..24).step_by(step.max(1) as usize).collect()
}
