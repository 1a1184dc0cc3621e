//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Journal lines (debits and credits in minor units)
//! - Line validation and the balance invariant
//! - Balance deltas per account type
//! - Reversing entries
//! - Entry numbering
//! - Error types for ledger operations

pub mod balance;
pub mod error;
pub mod numbering;
pub mod reversal;
pub mod service;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use balance::{AccountBalance, RunningBalance, balance_deltas};
pub use error::LedgerError;
pub use numbering::{format_entry_number, parse_entry_sequence};
pub use reversal::{ReversalPlan, ReversalService, reverse_lines};
pub use service::{AccountInfo, LedgerService};
pub use types::{
    AccountType, EntryState, EntryType, JournalLine, JournalSource, JournalTotals,
    NewJournalEntry, NormalBalance,
};
pub use validation::{DEFAULT_TOLERANCE_MINOR, validate_lines};
