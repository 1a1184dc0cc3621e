//! Property-based tests for journal line validation and reversal.

use proptest::prelude::*;
use scholaris_shared::types::{AccountId, Amount};

use super::balance::balance_deltas;
use super::error::LedgerError;
use super::reversal::reverse_lines;
use super::types::{AccountType, JournalLine};
use super::validation::validate_lines;

/// Amounts from 0.01 to 1,000,000.00 in minor units.
fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

/// Splits a total into a set of positive parts.
fn split(total: i64, parts: usize) -> Vec<i64> {
    let parts = i64::try_from(parts.max(1)).unwrap_or(1).min(total);
    let share = total / parts;
    let mut out = vec![share; usize::try_from(parts).unwrap_or(1)];
    if let Some(last) = out.last_mut() {
        *last += total - share * parts;
    }
    out
}

/// A balanced set of lines with `debits` debit lines and `credits` credit lines.
fn balanced_lines() -> impl Strategy<Value = Vec<JournalLine>> {
    (positive_amount(), 1usize..5, 1usize..5).prop_map(|(total, debits, credits)| {
        let mut lines: Vec<JournalLine> = split(total, debits)
            .into_iter()
            .map(|minor| JournalLine::debit(AccountId::new(), Amount::new(minor), None))
            .collect();
        lines.extend(
            split(total, credits)
                .into_iter()
                .map(|minor| JournalLine::credit(AccountId::new(), Amount::new(minor), None)),
        );
        lines
    })
}

fn account_type_strategy() -> impl Strategy<Value = AccountType> {
    prop::sample::select(AccountType::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every balanced line set passes and reports equal totals.
    #[test]
    fn prop_balanced_lines_accepted(lines in balanced_lines()) {
        let totals = validate_lines(&lines, 0).unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
    }

    /// Skewing one line by more than the tolerance breaks the balance.
    #[test]
    fn prop_skew_beyond_tolerance_rejected(
        lines in balanced_lines(),
        skew in 2i64..10_000,
    ) {
        let mut lines = lines;
        lines[0].debit += Amount::new(skew);
        let is_unbalanced = matches!(
            validate_lines(&lines, 1),
            Err(LedgerError::Unbalanced { .. })
        );
        prop_assert!(is_unbalanced);
    }

    /// A skew within the tolerance is accepted.
    #[test]
    fn prop_skew_within_tolerance_accepted(lines in balanced_lines()) {
        let mut lines = lines;
        lines[0].debit += Amount::new(1);
        prop_assert!(validate_lines(&lines, 1).is_ok());
    }

    /// A zero line anywhere rejects the whole set.
    #[test]
    fn prop_zero_line_rejected(lines in balanced_lines(), index in any::<prop::sample::Index>()) {
        let mut lines = lines;
        let i = index.index(lines.len());
        lines[i].debit = Amount::ZERO;
        lines[i].credit = Amount::ZERO;
        prop_assert_eq!(validate_lines(&lines, 1).unwrap_err(), LedgerError::ZeroAmount);
    }

    /// A reversal is balanced and cancels the original on every account.
    #[test]
    fn prop_reversal_nets_to_zero(
        lines in balanced_lines(),
        kinds in prop::collection::vec(account_type_strategy(), 10),
    ) {
        let reversed = reverse_lines(&lines);
        prop_assert!(validate_lines(&reversed, 0).is_ok());

        let type_of = |id: AccountId| {
            lines
                .iter()
                .position(|l| l.account_id == id)
                .map(|i| kinds[i % kinds.len()])
        };
        let mut combined = lines.clone();
        combined.extend(reversed);
        let deltas = balance_deltas(&combined, type_of).unwrap();
        for (_, delta) in deltas {
            prop_assert_eq!(delta, Amount::ZERO);
        }
    }
}
