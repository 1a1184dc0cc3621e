//! Ledger service for journal entry validation.
//!
//! Pure business logic with no database dependencies. Repositories call it
//! with a lookup over the school's chart of accounts before writing anything.

use scholaris_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{AccountType, JournalTotals, NewJournalEntry};
use super::validation::validate_lines;

/// Information about an account needed for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account ID.
    pub id: AccountId,
    /// Account classification.
    pub account_type: AccountType,
    /// Whether the account is active.
    pub is_active: bool,
}

/// Ledger service for journal entry validation.
pub struct LedgerService;

impl LedgerService {
    /// Validates a journal entry before it is persisted.
    ///
    /// Steps:
    /// 1. Description is not blank
    /// 2. Line rules and the balance invariant (`validate_lines`)
    /// 3. Every account exists in the school and is active
    ///
    /// `account_lookup` must only return accounts of `input.school_id`.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn validate_entry<F>(
        input: &NewJournalEntry,
        tolerance: u64,
        account_lookup: F,
    ) -> Result<JournalTotals, LedgerError>
    where
        F: Fn(AccountId) -> Option<AccountInfo>,
    {
        if input.description.trim().is_empty() {
            return Err(LedgerError::EmptyDescription);
        }

        let totals = validate_lines(&input.lines, tolerance)?;

        for line in &input.lines {
            let account = account_lookup(line.account_id)
                .ok_or(LedgerError::AccountNotFound(line.account_id))?;
            if !account.is_active {
                return Err(LedgerError::AccountInactive(account.id));
            }
        }

        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::NaiveDate;
    use scholaris_shared::types::{Amount, SchoolId};

    use super::*;
    use crate::ledger::types::{JournalLine, JournalSource};

    fn accounts(active: &[(AccountId, bool)]) -> HashMap<AccountId, AccountInfo> {
        active
            .iter()
            .map(|(id, is_active)| {
                (
                    *id,
                    AccountInfo {
                        id: *id,
                        account_type: AccountType::Asset,
                        is_active: *is_active,
                    },
                )
            })
            .collect()
    }

    fn entry(lines: Vec<JournalLine>) -> NewJournalEntry {
        NewJournalEntry {
            school_id: SchoolId::new(),
            entry_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            description: "Transfer to bank".to_string(),
            reference: None,
            source: JournalSource::Manual,
            lines,
            post: true,
        }
    }

    #[test]
    fn test_valid_entry() {
        let cash = AccountId::new();
        let bank = AccountId::new();
        let chart = accounts(&[(cash, true), (bank, true)]);
        let input = entry(vec![
            JournalLine::debit(bank, Amount::new(5_000), None),
            JournalLine::credit(cash, Amount::new(5_000), None),
        ]);

        let totals = LedgerService::validate_entry(&input, 1, |id| chart.get(&id).copied()).unwrap();
        assert_eq!(totals.debit, Amount::new(5_000));
    }

    #[test]
    fn test_unknown_account() {
        let cash = AccountId::new();
        let foreign = AccountId::new();
        let chart = accounts(&[(cash, true)]);
        let input = entry(vec![
            JournalLine::debit(foreign, Amount::new(5_000), None),
            JournalLine::credit(cash, Amount::new(5_000), None),
        ]);

        assert_eq!(
            LedgerService::validate_entry(&input, 1, |id| chart.get(&id).copied()),
            Err(LedgerError::AccountNotFound(foreign))
        );
    }

    #[test]
    fn test_inactive_account() {
        let cash = AccountId::new();
        let closed = AccountId::new();
        let chart = accounts(&[(cash, true), (closed, false)]);
        let input = entry(vec![
            JournalLine::debit(closed, Amount::new(5_000), None),
            JournalLine::credit(cash, Amount::new(5_000), None),
        ]);

        assert_eq!(
            LedgerService::validate_entry(&input, 1, |id| chart.get(&id).copied()),
            Err(LedgerError::AccountInactive(closed))
        );
    }

    #[test]
    fn test_line_rules_checked_before_accounts() {
        let input = entry(vec![JournalLine::debit(AccountId::new(), Amount::new(1), None)]);
        assert_eq!(
            LedgerService::validate_entry(&input, 1, |_| None),
            Err(LedgerError::InsufficientLines)
        );
    }

    #[test]
    fn test_blank_description() {
        let mut input = entry(vec![]);
        input.description = "   ".to_string();
        assert_eq!(
            LedgerService::validate_entry(&input, 1, |_| None),
            Err(LedgerError::EmptyDescription)
        );
    }
}
