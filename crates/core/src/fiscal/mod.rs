//! Fiscal year rules.

pub mod year;

pub use year::{
    FiscalRuleError, FiscalYearWindow, check_posting_allowed, ranges_overlap, validate_date_range,
};
