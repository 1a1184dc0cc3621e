//! Fiscal year windows and the posting rules that depend on them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by fiscal year rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FiscalRuleError {
    /// Start date is not before end date.
    #[error("Fiscal year start date {start} must be before end date {end}")]
    InvalidDateRange {
        /// Proposed start.
        start: NaiveDate,
        /// Proposed end.
        end: NaiveDate,
    },

    /// Proposed year overlaps an existing one.
    #[error("Fiscal year overlaps existing fiscal year '{0}'")]
    Overlap(String),

    /// No fiscal year covers the date.
    #[error("No fiscal year found for date {0}")]
    NoFiscalYear(NaiveDate),

    /// The date lies outside the fiscal year.
    #[error("Date {date} is outside the fiscal year ({start} to {end})")]
    DateOutsideYear {
        /// Requested date.
        date: NaiveDate,
        /// Year start.
        start: NaiveDate,
        /// Year end.
        end: NaiveDate,
    },

    /// The fiscal year is closed for posting.
    #[error("Fiscal year is closed, no posting allowed")]
    YearClosed,
}

impl FiscalRuleError {
    /// Returns an error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
            Self::Overlap(_) => "FISCAL_YEAR_OVERLAP",
            Self::NoFiscalYear(_) => "NO_FISCAL_YEAR",
            Self::DateOutsideYear { .. } => "DATE_OUTSIDE_FISCAL_YEAR",
            Self::YearClosed => "FISCAL_YEAR_CLOSED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. } => 400,
            Self::Overlap(_) => 409,
            Self::NoFiscalYear(_) | Self::DateOutsideYear { .. } | Self::YearClosed => 422,
        }
    }
}

/// Validates that `start` is strictly before `end`.
///
/// # Errors
///
/// Returns `InvalidDateRange` otherwise.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), FiscalRuleError> {
    if start >= end {
        return Err(FiscalRuleError::InvalidDateRange { start, end });
    }
    Ok(())
}

/// True when two inclusive date ranges share at least one day.
#[must_use]
pub fn ranges_overlap(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}

/// The slice of a fiscal year that posting rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearWindow {
    /// First day (inclusive).
    pub start: NaiveDate,
    /// Last day (inclusive).
    pub end: NaiveDate,
    /// Closed years reject new postings.
    pub is_closed: bool,
}

impl FiscalYearWindow {
    /// Returns true if the given date falls within this year.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Checks that an entry dated `date` may be posted into `window`.
///
/// # Errors
///
/// Returns `DateOutsideYear` or `YearClosed`.
pub fn check_posting_allowed(window: &FiscalYearWindow, date: NaiveDate) -> Result<(), FiscalRuleError> {
    if !window.contains(date) {
        return Err(FiscalRuleError::DateOutsideYear {
            date,
            start: window.start,
            end: window.end,
        });
    }
    if window.is_closed {
        return Err(FiscalRuleError::YearClosed);
    }
    Ok(())
}
