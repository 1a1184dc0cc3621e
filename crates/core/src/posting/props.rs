//! Property tests: every posting rule yields a balanced entry.

use std::collections::HashMap;

use chrono::NaiveDate;
use proptest::prelude::*;
use scholaris_shared::types::{AccountId, Amount, StudentId};

use super::accounts::SystemAccount;
use super::events::{ExpensePayment, FeeItem, FeeKind, PaymentMethod, PostingEvent};
use super::rules::PostingRules;
use crate::ledger::validate_lines;

fn amount() -> impl Strategy<Value = Amount> {
    (1i64..10_000_000).prop_map(Amount::new)
}

fn method() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![Just(PaymentMethod::Cash), Just(PaymentMethod::Bank)]
}

fn payment() -> impl Strategy<Value = ExpensePayment> {
    prop_oneof![
        Just(ExpensePayment::Cash),
        Just(ExpensePayment::Bank),
        Just(ExpensePayment::OnCredit)
    ]
}

fn fee_item() -> impl Strategy<Value = FeeItem> {
    (prop_oneof![Just(FeeKind::Tuition), Just(FeeKind::Other)], amount()).prop_map(|(kind, amount)| {
        FeeItem {
            kind,
            description: "fee".to_string(),
            amount,
        }
    })
}

fn event() -> impl Strategy<Value = PostingEvent> {
    let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap_or_default();
    prop_oneof![
        prop::collection::vec(fee_item(), 1..6).prop_map(move |items| PostingEvent::FeeInvoiced {
            student_id: StudentId::new(),
            date,
            items,
            reference: None,
        }),
        (amount(), method()).prop_map(move |(amount, method)| PostingEvent::FeePaymentReceived {
            student_id: StudentId::new(),
            date,
            amount,
            method,
            reference: None,
        }),
        (1_000i64..10_000_000, 0u8..30, 0u8..30, 0u8..30, method()).prop_map(
            move |(gross, tax, pension, other, method)| {
                let pct = |p: u8| Amount::new(gross * i64::from(p) / 100);
                PostingEvent::PayrollRun {
                    date,
                    period: "2025-03".to_string(),
                    gross: Amount::new(gross),
                    tax: pct(tax),
                    pension: pct(pension),
                    other_deductions: pct(other),
                    method,
                }
            }
        ),
        (amount(), payment()).prop_map(move |(amount, payment)| PostingEvent::ExpenseRecorded {
            date,
            description: "Repairs".to_string(),
            amount,
            expense_account: None,
            payment,
            reference: None,
        }),
        (amount(), method()).prop_map(move |(amount, method)| PostingEvent::WalletTopUp {
            student_id: StudentId::new(),
            date,
            amount,
            method,
        }),
        amount().prop_map(move |amount| PostingEvent::WalletSpend {
            student_id: StudentId::new(),
            date,
            amount,
            description: None,
        }),
        (amount(), method()).prop_map(move |(amount, method)| PostingEvent::WalletRefund {
            student_id: StudentId::new(),
            date,
            amount,
            method,
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_every_event_balances_exactly(event in event()) {
        let chart: HashMap<SystemAccount, AccountId> = SystemAccount::ALL
            .into_iter()
            .map(|role| (role, AccountId::new()))
            .collect();

        let entry = PostingRules::prepare(&event, &chart).unwrap();
        let totals = validate_lines(&entry.lines, 0).unwrap();
        prop_assert_eq!(totals.debit, totals.credit);
        prop_assert!(entry.lines.iter().all(|l| !l.amount().is_zero()));
        prop_assert_eq!(entry.source, event.source());
    }
}
