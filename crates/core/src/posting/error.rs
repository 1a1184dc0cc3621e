//! Posting rule errors.

use scholaris_shared::types::Amount;
use thiserror::Error;

use super::accounts::SystemAccount;
use crate::ledger::LedgerError;

/// Errors that can occur while turning an event into journal lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostingError {
    /// The school's chart of accounts lacks a required account.
    #[error("Missing required account: {0}")]
    MissingAccount(SystemAccount),

    /// Event amount must be positive.
    #[error("Amount must be positive, got {0}")]
    InvalidAmount(Amount),

    /// Fee invoice has no billable items.
    #[error("Fee invoice must contain at least one item")]
    EmptyInvoice,

    /// Payroll figures are inconsistent.
    #[error("Invalid payroll: {0}")]
    InvalidPayroll(String),

    /// The produced lines failed ledger validation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl PostingError {
    /// Returns an error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::MissingAccount(_) => "MISSING_ACCOUNT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::EmptyInvoice => "EMPTY_INVOICE",
            Self::InvalidPayroll(_) => "INVALID_PAYROLL",
            Self::Ledger(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingAccount(_) => 422,
            Self::InvalidAmount(_) | Self::EmptyInvoice | Self::InvalidPayroll(_) => 400,
            Self::Ledger(e) => e.http_status_code(),
        }
    }
}
