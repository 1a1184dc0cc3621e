//! Ledger error types for validation and state errors.

use scholaris_shared::types::{AccountId, Amount};
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Journal entry must have at least 2 lines.
    #[error("Journal entry must have at least 2 lines")]
    InsufficientLines,

    /// Line amount cannot be zero.
    #[error("Line amount cannot be zero")]
    ZeroAmount,

    /// Line amount cannot be negative.
    #[error("Line amount cannot be negative")]
    NegativeAmount,

    /// Line must specify either debit or credit, not both.
    #[error("Line must specify either debit or credit, not both")]
    BothSides,

    /// Entry needs at least one debit and one credit line.
    #[error("Journal entry needs at least one debit and one credit line")]
    SingleSided,

    /// Debits and credits differ by more than the rounding tolerance.
    #[error("Journal entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit.
        debit: Amount,
        /// Total credit.
        credit: Amount,
    },

    /// Totals overflowed the amount range.
    #[error("Journal entry totals are out of range")]
    AmountOverflow,

    /// Entry description is required.
    #[error("Journal entry description is required")]
    EmptyDescription,

    // ========== Account Errors ==========
    /// Account not found in this school.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    // ========== Entry State Errors ==========
    /// Entry has already been posted.
    #[error("Journal entry is already posted")]
    AlreadyPosted,

    /// Entry must be posted first.
    #[error("Only posted journal entries can be reversed")]
    NotPosted,

    /// Entry already has a reversal.
    #[error("Journal entry has already been reversed")]
    AlreadyReversed,

    /// Reversals cannot themselves be reversed.
    #[error("A reversal entry cannot be reversed")]
    CannotReverseReversal,

    /// Posted entries are immutable.
    #[error("Cannot modify a posted journal entry")]
    CannotModifyPosted,

    /// Only drafts can be deleted.
    #[error("Can only delete draft journal entries")]
    CanOnlyDeleteDraft,
}

impl LedgerError {
    /// Returns an error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::BothSides => "BOTH_SIDES",
            Self::SingleSided => "SINGLE_SIDED",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::AmountOverflow => "AMOUNT_OVERFLOW",
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AlreadyPosted => "ALREADY_POSTED",
            Self::NotPosted => "NOT_POSTED",
            Self::AlreadyReversed => "ALREADY_REVERSED",
            Self::CannotReverseReversal => "CANNOT_REVERSE_REVERSAL",
            Self::CannotModifyPosted => "CANNOT_MODIFY_POSTED",
            Self::CanOnlyDeleteDraft => "CAN_ONLY_DELETE_DRAFT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::InsufficientLines
            | Self::ZeroAmount
            | Self::NegativeAmount
            | Self::BothSides
            | Self::SingleSided
            | Self::Unbalanced { .. }
            | Self::AmountOverflow
            | Self::EmptyDescription => 400,
            Self::AccountNotFound(_) => 404,
            Self::AccountInactive(_)
            | Self::AlreadyPosted
            | Self::NotPosted
            | Self::CannotReverseReversal
            | Self::CannotModifyPosted
            | Self::CanOnlyDeleteDraft => 422,
            Self::AlreadyReversed => 409,
        }
    }
}
