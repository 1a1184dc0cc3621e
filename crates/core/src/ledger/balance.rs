//! Account balance calculations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use scholaris_shared::types::{AccountId, Amount};

use super::error::LedgerError;
use super::types::{AccountType, JournalLine};

/// Aggregates the signed balance change each account receives from `lines`.
///
/// The result is ordered by account id so callers touch balance rows in a
/// stable order.
///
/// # Errors
///
/// Returns `AccountNotFound` if `account_type` cannot resolve a line's account.
pub fn balance_deltas<F>(
    lines: &[JournalLine],
    account_type: F,
) -> Result<Vec<(AccountId, Amount)>, LedgerError>
where
    F: Fn(AccountId) -> Option<AccountType>,
{
    let mut deltas: BTreeMap<AccountId, Amount> = BTreeMap::new();
    for line in lines {
        let kind = account_type(line.account_id).ok_or(LedgerError::AccountNotFound(line.account_id))?;
        let delta = kind.normal_balance().balance_delta(line.debit, line.credit);
        *deltas.entry(line.account_id).or_default() += delta;
    }
    Ok(deltas.into_iter().collect())
}

/// Debit/credit totals and signed balance of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// The account ID.
    pub account_id: AccountId,
    /// Account classification.
    pub account_type: AccountType,
    /// Total debit amount.
    pub debit_total: Amount,
    /// Total credit amount.
    pub credit_total: Amount,
    /// Net balance on the account's normal side.
    pub balance: Amount,
}

impl AccountBalance {
    /// Creates an empty balance.
    #[must_use]
    pub fn new(account_id: AccountId, account_type: AccountType) -> Self {
        Self {
            account_id,
            account_type,
            debit_total: Amount::ZERO,
            credit_total: Amount::ZERO,
            balance: Amount::ZERO,
        }
    }

    /// Applies a journal line.
    pub fn apply(&mut self, line: &JournalLine) {
        self.debit_total += line.debit;
        self.credit_total += line.credit;
        self.balance = self
            .account_type
            .normal_balance()
            .balance_delta(self.debit_total, self.credit_total);
    }
}

/// Running balance of an account at one point in the chain.
///
/// `previous` is the balance before the change, `current` the balance after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningBalance {
    /// Balance before this change.
    pub previous: Amount,
    /// Balance after this change.
    pub current: Amount,
}

impl RunningBalance {
    /// Creates the running balance for the first change on an account.
    #[must_use]
    pub fn first(delta: Amount) -> Self {
        Self {
            previous: Amount::ZERO,
            current: delta,
        }
    }

    /// Starts a chain from a known opening balance.
    #[must_use]
    pub fn opening(balance: Amount) -> Self {
        Self {
            previous: balance,
            current: balance,
        }
    }

    /// Chains another change after this one.
    #[must_use]
    pub fn apply(&self, delta: Amount) -> Self {
        Self {
            previous: self.current,
            current: self.current + delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_deltas_follow_normal_balance() {
        let cash = AccountId::new();
        let revenue = AccountId::new();
        let lines = [
            JournalLine::debit(cash, Amount::new(25_000), None),
            JournalLine::credit(revenue, Amount::new(25_000), None),
        ];
        let deltas = balance_deltas(&lines, |id| {
            Some(if id == cash {
                AccountType::Asset
            } else {
                AccountType::Revenue
            })
        })
        .unwrap();

        assert_eq!(deltas.len(), 2);
        for (account, delta) in deltas {
            assert_eq!(delta, Amount::new(25_000), "account {account}");
        }
    }

    #[test]
    fn test_deltas_aggregate_repeated_accounts() {
        let bank = AccountId::new();
        let payable = AccountId::new();
        let lines = [
            JournalLine::debit(bank, Amount::new(1_000), None),
            JournalLine::credit(bank, Amount::new(400), None),
            JournalLine::credit(payable, Amount::new(600), None),
        ];
        let deltas = balance_deltas(&lines, |id| {
            Some(if id == bank {
                AccountType::Asset
            } else {
                AccountType::Liability
            })
        })
        .unwrap();

        let bank_delta = deltas.iter().find(|(id, _)| *id == bank).map(|(_, d)| *d);
        assert_eq!(bank_delta, Some(Amount::new(600)));
    }

    #[test]
    fn test_unknown_account_rejected() {
        let lines = [JournalLine::debit(AccountId::new(), Amount::new(1), None)];
        assert!(matches!(
            balance_deltas(&lines, |_| None),
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_account_balance_apply() {
        let mut balance = AccountBalance::new(AccountId::new(), AccountType::Liability);
        balance.apply(&JournalLine::credit(balance.account_id, Amount::new(900), None));
        balance.apply(&JournalLine::debit(balance.account_id, Amount::new(200), None));
        assert_eq!(balance.debit_total, Amount::new(200));
        assert_eq!(balance.credit_total, Amount::new(900));
        assert_eq!(balance.balance, Amount::new(700));
    }

    fn delta_strategy() -> impl Strategy<Value = Amount> {
        (-10_000_000i64..10_000_000i64).prop_map(Amount::new)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Each link starts where the previous one ended, and the chain ends at
        /// the sum of all changes.
        #[test]
        fn prop_running_balance_chain(
            deltas in prop::collection::vec(delta_strategy(), 1..30),
        ) {
            let mut running = RunningBalance::first(deltas[0]);
            prop_assert_eq!(running.previous, Amount::ZERO);
            for delta in &deltas[1..] {
                let next = running.apply(*delta);
                prop_assert_eq!(next.previous, running.current);
                prop_assert_eq!(next.current, next.previous + *delta);
                running = next;
            }
            let expected: Amount = deltas.iter().copied().sum();
            prop_assert_eq!(running.current, expected);
        }
    }
}
