//! Ledger domain types for journal entry creation and validation.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use scholaris_shared::types::{AccountId, Amount, SchoolId};

use super::error::LedgerError;

/// Chart of accounts classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Things the school owns (cash, bank, receivables).
    Asset,
    /// Things the school owes (wallet deposits, payables).
    Liability,
    /// Owner's interest in the school.
    Equity,
    /// Income (tuition, fees).
    Revenue,
    /// Costs (salaries, supplies).
    Expense,
}

impl AccountType {
    /// All account types in chart order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the side on which this account type normally carries its balance.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Lowercase name used in storage and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asset" => Ok(Self::Asset),
            "liability" => Ok(Self::Liability),
            "equity" => Ok(Self::Equity),
            "revenue" => Ok(Self::Revenue),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown account type: {s}")),
        }
    }
}

/// Normal balance side of an account.
///
/// - Asset/Expense: balance += debit - credit (debit-normal)
/// - Liability/Equity/Revenue: balance += credit - debit (credit-normal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Debit-normal accounts (Asset, Expense).
    Debit,
    /// Credit-normal accounts (Liability, Equity, Revenue).
    Credit,
}

impl NormalBalance {
    /// Calculates the signed balance change for a line.
    #[must_use]
    pub fn balance_delta(self, debit: Amount, credit: Amount) -> Amount {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Entry side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Debit entry.
    Debit,
    /// Credit entry.
    Credit,
}

/// Module of the school that produced a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalSource {
    /// Hand-keyed journal entry.
    Manual,
    /// Fee invoices and fee payments.
    Fees,
    /// Payroll runs.
    Payroll,
    /// Operating expenses.
    Expense,
    /// Student wallet top-ups, spends and refunds.
    Wallet,
    /// Reversal of an earlier entry.
    Reversal,
    /// Opening balances carried in.
    OpeningBalance,
}

impl JournalSource {
    /// Snake-case name used in storage and the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Fees => "fees",
            Self::Payroll => "payroll",
            Self::Expense => "expense",
            Self::Wallet => "wallet",
            Self::Reversal => "reversal",
            Self::OpeningBalance => "opening_balance",
        }
    }
}

impl fmt::Display for JournalSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JournalSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "fees" => Ok(Self::Fees),
            "payroll" => Ok(Self::Payroll),
            "expense" => Ok(Self::Expense),
            "wallet" => Ok(Self::Wallet),
            "reversal" => Ok(Self::Reversal),
            "opening_balance" => Ok(Self::OpeningBalance),
            _ => Err(format!("Unknown journal source: {s}")),
        }
    }
}

/// A single debit or credit line of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// The account to post to.
    pub account_id: AccountId,
    /// Debit amount in minor units (zero on credit lines).
    pub debit: Amount,
    /// Credit amount in minor units (zero on debit lines).
    pub credit: Amount,
    /// Optional line description.
    pub description: Option<String>,
}

impl JournalLine {
    /// Creates a debit line.
    #[must_use]
    pub fn debit(account_id: AccountId, amount: Amount, description: Option<String>) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Amount::ZERO,
            description,
        }
    }

    /// Creates a credit line.
    #[must_use]
    pub fn credit(account_id: AccountId, amount: Amount, description: Option<String>) -> Self {
        Self {
            account_id,
            debit: Amount::ZERO,
            credit: amount,
            description,
        }
    }

    /// Returns the side of a well-formed line.
    #[must_use]
    pub fn entry_type(&self) -> Option<EntryType> {
        match (self.debit.is_positive(), self.credit.is_positive()) {
            (true, false) => Some(EntryType::Debit),
            (false, true) => Some(EntryType::Credit),
            _ => None,
        }
    }

    /// Returns the amount on whichever side is set.
    #[must_use]
    pub fn amount(&self) -> Amount {
        if self.debit.is_zero() {
            self.credit
        } else {
            self.debit
        }
    }
}

/// Input for creating a journal entry.
#[derive(Debug, Clone)]
pub struct NewJournalEntry {
    /// The school this entry belongs to.
    pub school_id: SchoolId,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narrative.
    pub description: String,
    /// Optional external reference (receipt number, payroll batch, ...).
    pub reference: Option<String>,
    /// Producing module.
    pub source: JournalSource,
    /// Debit and credit lines.
    pub lines: Vec<JournalLine>,
    /// Post immediately after writing.
    pub post: bool,
}

/// Sum of debits and credits for a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalTotals {
    /// Total debit.
    pub debit: Amount,
    /// Total credit.
    pub credit: Amount,
}

impl JournalTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub const fn new(debit: Amount, credit: Amount) -> Self {
        Self { debit, credit }
    }

    /// Debit minus credit.
    #[must_use]
    pub fn difference(&self) -> Amount {
        self.debit - self.credit
    }

    /// True when the gap between the two sides is within `tolerance` minor units.
    #[must_use]
    pub const fn is_balanced(&self, tolerance: u64) -> bool {
        self.debit.abs_diff(self.credit) <= tolerance
    }
}

/// Lifecycle flags of a stored journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryState {
    /// Balances have been applied.
    pub is_posted: bool,
    /// A reversing entry has been created for this entry.
    pub is_reversed: bool,
    /// This entry is itself a reversal.
    pub is_reversal: bool,
}

impl EntryState {
    /// A draft can be posted once.
    pub fn can_post(&self) -> Result<(), LedgerError> {
        if self.is_posted {
            return Err(LedgerError::AlreadyPosted);
        }
        Ok(())
    }

    /// Only posted, not yet reversed, non-reversal entries can be reversed.
    pub fn can_reverse(&self) -> Result<(), LedgerError> {
        if !self.is_posted {
            return Err(LedgerError::NotPosted);
        }
        if self.is_reversal {
            return Err(LedgerError::CannotReverseReversal);
        }
        if self.is_reversed {
            return Err(LedgerError::AlreadyReversed);
        }
        Ok(())
    }

    /// Posted entries are immutable.
    pub fn can_edit(&self) -> Result<(), LedgerError> {
        if self.is_posted {
            return Err(LedgerError::CannotModifyPosted);
        }
        Ok(())
    }

    /// Only drafts can be deleted.
    pub fn can_delete(&self) -> Result<(), LedgerError> {
        if self.is_posted {
            return Err(LedgerError::CanOnlyDeleteDraft);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_balance_by_type() {
        assert_eq!(AccountType::Asset.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Expense.normal_balance(), NormalBalance::Debit);
        assert_eq!(AccountType::Liability.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Equity.normal_balance(), NormalBalance::Credit);
        assert_eq!(AccountType::Revenue.normal_balance(), NormalBalance::Credit);
    }

    #[test]
    fn test_balance_delta() {
        let debit = Amount::new(10_000);
        let credit = Amount::new(2_500);
        assert_eq!(
            NormalBalance::Debit.balance_delta(debit, credit),
            Amount::new(7_500)
        );
        assert_eq!(
            NormalBalance::Credit.balance_delta(debit, credit),
            Amount::new(-7_500)
        );
    }

    #[test]
    fn test_account_type_round_trip_names() {
        for account_type in AccountType::ALL {
            assert_eq!(account_type.as_str().parse::<AccountType>(), Ok(account_type));
        }
        assert_eq!("ASSET".parse::<AccountType>(), Ok(AccountType::Asset));
        assert!("income".parse::<AccountType>().is_err());
    }

    #[test]
    fn test_line_side() {
        let account = AccountId::new();
        assert_eq!(
            JournalLine::debit(account, Amount::new(1), None).entry_type(),
            Some(EntryType::Debit)
        );
        assert_eq!(
            JournalLine::credit(account, Amount::new(1), None).entry_type(),
            Some(EntryType::Credit)
        );
        assert_eq!(
            JournalLine::debit(account, Amount::ZERO, None).entry_type(),
            None
        );
    }

    #[test]
    fn test_totals_tolerance() {
        let totals = JournalTotals::new(Amount::new(10_001), Amount::new(10_000));
        assert!(totals.is_balanced(1));
        assert!(!totals.is_balanced(0));
        assert_eq!(totals.difference(), Amount::new(1));
    }

    #[test]
    fn test_entry_state_transitions() {
        let draft = EntryState::default();
        assert!(draft.can_post().is_ok());
        assert!(draft.can_edit().is_ok());
        assert!(draft.can_delete().is_ok());
        assert!(matches!(draft.can_reverse(), Err(LedgerError::NotPosted)));

        let posted = EntryState {
            is_posted: true,
            ..EntryState::default()
        };
        assert!(matches!(posted.can_post(), Err(LedgerError::AlreadyPosted)));
        assert!(matches!(posted.can_edit(), Err(LedgerError::CannotModifyPosted)));
        assert!(matches!(posted.can_delete(), Err(LedgerError::CanOnlyDeleteDraft)));
        assert!(posted.can_reverse().is_ok());

        let reversed = EntryState {
            is_reversed: true,
            ..posted
        };
        assert!(matches!(reversed.can_reverse(), Err(LedgerError::AlreadyReversed)));

        let reversal = EntryState {
            is_reversal: true,
            ..posted
        };
        assert!(matches!(
            reversal.can_reverse(),
            Err(LedgerError::CannotReverseReversal)
        ));
    }
}
