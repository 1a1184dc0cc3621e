//! Posting rules: business events to balanced journal lines.
//!
//! Fees, payroll, expenses and student wallets never write journal lines by
//! hand. They describe what happened as a [`PostingEvent`] and the rules in
//! this module turn it into lines against the school's system accounts.

pub mod accounts;
pub mod error;
pub mod events;
pub mod rules;

#[cfg(test)]
mod props;

pub use accounts::{AccountResolver, SystemAccount};
pub use error::PostingError;
pub use events::{ExpensePayment, FeeItem, FeeKind, PaymentMethod, PostingEvent};
pub use rules::{PostingRules, PreparedEntry};

#[cfg(test)]
pub use accounts::MockAccountResolver;
