//! Business rule validation for journal lines.

use scholaris_shared::types::Amount;

use super::error::LedgerError;
use super::types::{JournalLine, JournalTotals};

/// Default rounding tolerance in minor units.
pub const DEFAULT_TOLERANCE_MINOR: u64 = 1;

/// Validates a set of journal lines and returns their totals.
///
/// Rules, checked in order:
/// 1. At least two lines.
/// 2. Every line carries exactly one positive side.
/// 3. At least one debit line and one credit line.
/// 4. `|debit - credit| <= tolerance`.
///
/// # Errors
///
/// Returns the first rule the lines violate.
pub fn validate_lines(lines: &[JournalLine], tolerance: u64) -> Result<JournalTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    let mut total_debit = Amount::ZERO;
    let mut total_credit = Amount::ZERO;
    let mut has_debit = false;
    let mut has_credit = false;

    for line in lines {
        if line.debit.is_negative() || line.credit.is_negative() {
            return Err(LedgerError::NegativeAmount);
        }
        match (line.debit.is_positive(), line.credit.is_positive()) {
            (true, true) => return Err(LedgerError::BothSides),
            (false, false) => return Err(LedgerError::ZeroAmount),
            (true, false) => {
                total_debit = total_debit
                    .checked_add(line.debit)
                    .ok_or(LedgerError::AmountOverflow)?;
                has_debit = true;
            }
            (false, true) => {
                total_credit = total_credit
                    .checked_add(line.credit)
                    .ok_or(LedgerError::AmountOverflow)?;
                has_credit = true;
            }
        }
    }

    if !has_debit || !has_credit {
        return Err(LedgerError::SingleSided);
    }

    let totals = JournalTotals::new(total_debit, total_credit);
    if !totals.is_balanced(tolerance) {
        return Err(LedgerError::Unbalanced {
            debit: total_debit,
            credit: total_credit,
        });
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use scholaris_shared::types::AccountId;

    fn dr(minor: i64) -> JournalLine {
        JournalLine::debit(AccountId::new(), Amount::new(minor), None)
    }

    fn cr(minor: i64) -> JournalLine {
        JournalLine::credit(AccountId::new(), Amount::new(minor), None)
    }

    #[test]
    fn test_balanced_entry_returns_totals() {
        let totals = validate_lines(&[dr(50_000), cr(30_000), cr(20_000)], 1).unwrap();
        assert_eq!(totals.debit, Amount::new(50_000));
        assert_eq!(totals.credit, Amount::new(50_000));
    }

    #[test]
    fn test_one_minor_unit_is_tolerated() {
        assert!(validate_lines(&[dr(10_001), cr(10_000)], 1).is_ok());
        assert!(matches!(
            validate_lines(&[dr(10_002), cr(10_000)], 1),
            Err(LedgerError::Unbalanced { .. })
        ));
    }

    #[rstest]
    #[case::empty(vec![], LedgerError::InsufficientLines)]
    #[case::single(vec![dr(100)], LedgerError::InsufficientLines)]
    #[case::zero(vec![dr(0), cr(0)], LedgerError::ZeroAmount)]
    #[case::negative(vec![dr(-100), cr(-100)], LedgerError::NegativeAmount)]
    #[case::debits_only(vec![dr(100), dr(100)], LedgerError::SingleSided)]
    #[case::credits_only(vec![cr(100), cr(100)], LedgerError::SingleSided)]
    fn test_rejected_line_sets(#[case] lines: Vec<JournalLine>, #[case] expected: LedgerError) {
        assert_eq!(validate_lines(&lines, 1).unwrap_err(), expected);
    }

    #[test]
    fn test_both_sides_rejected() {
        let mut line = dr(100);
        line.credit = Amount::new(100);
        assert_eq!(
            validate_lines(&[line, cr(100)], 1).unwrap_err(),
            LedgerError::BothSides
        );
    }

    #[test]
    fn test_overflow_is_reported() {
        let lines = [dr(i64::MAX), dr(1), cr(1)];
        assert_eq!(
            validate_lines(&lines, 1).unwrap_err(),
            LedgerError::AmountOverflow
        );
    }
}
