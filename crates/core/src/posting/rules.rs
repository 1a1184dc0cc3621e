//! Posting rules.
//!
//! | Event | Debit | Credit |
//! |---|---|---|
//! | Fee invoiced | Fees receivable | Tuition / other fee revenue |
//! | Fee payment | Cash or bank | Fees receivable |
//! | Payroll run | Salary expense (gross) | Tax, pension, salaries payable, cash or bank (net) |
//! | Expense | Expense account | Cash, bank or accounts payable |
//! | Wallet top-up | Cash or bank | Student wallet |
//! | Wallet spend | Student wallet | Wallet revenue |
//! | Wallet refund | Student wallet | Cash or bank |

use chrono::NaiveDate;
use scholaris_shared::types::{AccountId, Amount, SchoolId};

use super::accounts::{AccountResolver, SystemAccount};
use super::error::PostingError;
use super::events::PostingEvent;
use crate::ledger::{JournalLine, JournalSource, LedgerError, NewJournalEntry, validate_lines};

/// Journal entry content produced by a posting rule, not yet tied to a school.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedEntry {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narrative.
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Producing module.
    pub source: JournalSource,
    /// Balanced lines.
    pub lines: Vec<JournalLine>,
}

impl PreparedEntry {
    /// Turns the prepared entry into a journal entry that posts immediately.
    #[must_use]
    pub fn into_new_entry(self, school_id: SchoolId) -> NewJournalEntry {
        NewJournalEntry {
            school_id,
            entry_date: self.entry_date,
            description: self.description,
            reference: self.reference,
            source: self.source,
            lines: self.lines,
            post: true,
        }
    }
}

/// Stateless posting rule engine.
pub struct PostingRules;

impl PostingRules {
    /// Builds the balanced lines for `event`.
    ///
    /// Zero-amount lines (e.g. a payroll without pension) are left out.
    ///
    /// # Errors
    ///
    /// Returns `MissingAccount` when the school lacks a required account, or
    /// an amount error when the event figures are invalid.
    pub fn prepare<R>(event: &PostingEvent, resolver: &R) -> Result<PreparedEntry, PostingError>
    where
        R: AccountResolver + ?Sized,
    {
        let mut builder = LineBuilder::new(resolver);

        let (description, reference) = match event {
            PostingEvent::FeeInvoiced {
                student_id,
                items,
                reference,
                ..
            } => {
                if items.is_empty() {
                    return Err(PostingError::EmptyInvoice);
                }
                let mut total = Amount::ZERO;
                for item in items {
                    require_positive(item.amount)?;
                    total = total
                        .checked_add(item.amount)
                        .ok_or(LedgerError::AmountOverflow)?;
                }
                builder.debit(SystemAccount::FeesReceivable, total, None)?;
                for item in items {
                    builder.credit(
                        item.kind.revenue_account(),
                        item.amount,
                        Some(item.description.clone()),
                    )?;
                }
                (
                    format!("Fees invoiced to student {student_id}"),
                    reference.clone(),
                )
            }
            PostingEvent::FeePaymentReceived {
                student_id,
                amount,
                method,
                reference,
                ..
            } => {
                require_positive(*amount)?;
                builder.debit(method.account(), *amount, None)?;
                builder.credit(SystemAccount::FeesReceivable, *amount, None)?;
                (
                    format!("Fee payment from student {student_id}"),
                    reference.clone(),
                )
            }
            PostingEvent::PayrollRun {
                period,
                gross,
                tax,
                pension,
                other_deductions,
                method,
                ..
            } => {
                require_positive(*gross)?;
                let net = payroll_net(*gross, *tax, *pension, *other_deductions)?;
                builder.debit(SystemAccount::SalaryExpense, *gross, Some("Gross salaries".into()))?;
                builder.credit(SystemAccount::TaxPayable, *tax, Some("Income tax withheld".into()))?;
                builder.credit(SystemAccount::PensionPayable, *pension, Some("Pension withheld".into()))?;
                builder.credit(
                    SystemAccount::SalariesPayable,
                    *other_deductions,
                    Some("Other deductions".into()),
                )?;
                builder.credit(method.account(), net, Some("Net pay".into()))?;
                (
                    format!("Payroll for {period}"),
                    Some(format!("PAYROLL-{period}")),
                )
            }
            PostingEvent::ExpenseRecorded {
                description,
                amount,
                expense_account,
                payment,
                reference,
                ..
            } => {
                require_positive(*amount)?;
                match expense_account {
                    Some(account) => builder.push_debit(*account, *amount, None),
                    None => builder.debit(SystemAccount::GeneralExpense, *amount, None)?,
                }
                builder.credit(payment.account(), *amount, None)?;
                (description.clone(), reference.clone())
            }
            PostingEvent::WalletTopUp {
                student_id,
                amount,
                method,
                ..
            } => {
                require_positive(*amount)?;
                builder.debit(method.account(), *amount, None)?;
                builder.credit(SystemAccount::StudentWallet, *amount, None)?;
                (format!("Wallet top-up for student {student_id}"), None)
            }
            PostingEvent::WalletSpend {
                student_id,
                amount,
                description,
                ..
            } => {
                require_positive(*amount)?;
                builder.debit(SystemAccount::StudentWallet, *amount, None)?;
                builder.credit(SystemAccount::WalletRevenue, *amount, description.clone())?;
                (format!("Wallet purchase by student {student_id}"), None)
            }
            PostingEvent::WalletRefund {
                student_id,
                amount,
                method,
                ..
            } => {
                require_positive(*amount)?;
                builder.debit(SystemAccount::StudentWallet, *amount, None)?;
                builder.credit(method.account(), *amount, None)?;
                (format!("Wallet refund to student {student_id}"), None)
            }
        };

        let lines = builder.finish();
        validate_lines(&lines, 0)?;

        Ok(PreparedEntry {
            entry_date: event.date(),
            description,
            reference,
            source: event.source(),
            lines,
        })
    }
}

/// Net pay after deductions.
fn payroll_net(
    gross: Amount,
    tax: Amount,
    pension: Amount,
    other: Amount,
) -> Result<Amount, PostingError> {
    if tax.is_negative() || pension.is_negative() || other.is_negative() {
        return Err(PostingError::InvalidPayroll(
            "deductions cannot be negative".to_string(),
        ));
    }
    let net = gross
        .checked_sub(tax)
        .and_then(|n| n.checked_sub(pension))
        .and_then(|n| n.checked_sub(other))
        .ok_or(LedgerError::AmountOverflow)?;
    if !net.is_positive() {
        return Err(PostingError::InvalidPayroll(format!(
            "deductions exceed gross pay of {gross}"
        )));
    }
    Ok(net)
}

fn require_positive(amount: Amount) -> Result<(), PostingError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(PostingError::InvalidAmount(amount))
    }
}

/// Collects lines, resolving roles and dropping zero amounts.
struct LineBuilder<'a, R: ?Sized> {
    resolver: &'a R,
    lines: Vec<JournalLine>,
}

impl<'a, R: AccountResolver + ?Sized> LineBuilder<'a, R> {
    fn new(resolver: &'a R) -> Self {
        Self {
            resolver,
            lines: Vec::new(),
        }
    }

    fn account(&self, role: SystemAccount) -> Result<AccountId, PostingError> {
        self.resolver
            .resolve(role)
            .ok_or(PostingError::MissingAccount(role))
    }

    fn debit(
        &mut self,
        role: SystemAccount,
        amount: Amount,
        description: Option<String>,
    ) -> Result<(), PostingError> {
        if amount.is_zero() {
            return Ok(());
        }
        let account = self.account(role)?;
        self.push_debit(account, amount, description);
        Ok(())
    }

    fn credit(
        &mut self,
        role: SystemAccount,
        amount: Amount,
        description: Option<String>,
    ) -> Result<(), PostingError> {
        if amount.is_zero() {
            return Ok(());
        }
        let account = self.account(role)?;
        self.lines.push(JournalLine::credit(account, amount, description));
        Ok(())
    }

    fn push_debit(&mut self, account: AccountId, amount: Amount, description: Option<String>) {
        if !amount.is_zero() {
            self.lines.push(JournalLine::debit(account, amount, description));
        }
    }

    fn finish(self) -> Vec<JournalLine> {
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::posting::accounts::MockAccountResolver;
    use crate::posting::events::{ExpensePayment, FeeItem, FeeKind, PaymentMethod};
    use scholaris_shared::types::StudentId;

    fn chart() -> HashMap<SystemAccount, AccountId> {
        SystemAccount::ALL
            .into_iter()
            .map(|role| (role, AccountId::new()))
            .collect()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
    }

    fn line_for(
        entry: &PreparedEntry,
        chart: &HashMap<SystemAccount, AccountId>,
        role: SystemAccount,
    ) -> JournalLine {
        entry
            .lines
            .iter()
            .find(|l| l.account_id == chart[&role])
            .cloned()
            .unwrap_or_else(|| panic!("no line for {role}"))
    }

    #[test]
    fn test_fee_invoice() {
        let chart = chart();
        let event = PostingEvent::FeeInvoiced {
            student_id: StudentId::new(),
            date: date(),
            items: vec![
                FeeItem {
                    kind: FeeKind::Tuition,
                    description: "Term 1 tuition".into(),
                    amount: Amount::new(150_000),
                },
                FeeItem {
                    kind: FeeKind::Other,
                    description: "Uniform".into(),
                    amount: Amount::new(20_000),
                },
            ],
            reference: Some("INV-001".into()),
        };

        let entry = PostingRules::prepare(&event, &chart).unwrap();
        assert_eq!(entry.source, JournalSource::Fees);
        assert_eq!(entry.reference.as_deref(), Some("INV-001"));
        assert_eq!(
            line_for(&entry, &chart, SystemAccount::FeesReceivable).debit,
            Amount::new(170_000)
        );
        assert_eq!(
            line_for(&entry, &chart, SystemAccount::TuitionRevenue).credit,
            Amount::new(150_000)
        );
        assert_eq!(
            line_for(&entry, &chart, SystemAccount::OtherFeeRevenue).credit,
            Amount::new(20_000)
        );
    }

    #[test]
    fn test_empty_invoice_rejected() {
        let event = PostingEvent::FeeInvoiced {
            student_id: StudentId::new(),
            date: date(),
            items: vec![],
            reference: None,
        };
        assert_eq!(
            PostingRules::prepare(&event, &chart()),
            Err(PostingError::EmptyInvoice)
        );
    }

    #[test]
    fn test_fee_payment_by_bank() {
        let chart = chart();
        let event = PostingEvent::FeePaymentReceived {
            student_id: StudentId::new(),
            date: date(),
            amount: Amount::new(50_000),
            method: PaymentMethod::Bank,
            reference: None,
        };
        let entry = PostingRules::prepare(&event, &chart).unwrap();
        assert_eq!(line_for(&entry, &chart, SystemAccount::Bank).debit, Amount::new(50_000));
        assert_eq!(
            line_for(&entry, &chart, SystemAccount::FeesReceivable).credit,
            Amount::new(50_000)
        );
    }

    #[test]
    fn test_payroll_splits_deductions() {
        let chart = chart();
        let event = PostingEvent::PayrollRun {
            date: date(),
            period: "2025-01".into(),
            gross: Amount::new(1_000_000),
            tax: Amount::new(75_000),
            pension: Amount::new(80_000),
            other_deductions: Amount::ZERO,
            method: PaymentMethod::Bank,
        };
        let entry = PostingRules::prepare(&event, &chart).unwrap();

        assert_eq!(entry.lines.len(), 4, "zero deduction line omitted");
        assert_eq!(entry.reference.as_deref(), Some("PAYROLL-2025-01"));
        assert_eq!(
            line_for(&entry, &chart, SystemAccount::SalaryExpense).debit,
            Amount::new(1_000_000)
        );
        assert_eq!(line_for(&entry, &chart, SystemAccount::Bank).credit, Amount::new(845_000));
    }

    #[test]
    fn test_payroll_deductions_cannot_exceed_gross() {
        let event = PostingEvent::PayrollRun {
            date: date(),
            period: "2025-01".into(),
            gross: Amount::new(100),
            tax: Amount::new(60),
            pension: Amount::new(40),
            other_deductions: Amount::ZERO,
            method: PaymentMethod::Cash,
        };
        assert!(matches!(
            PostingRules::prepare(&event, &chart()),
            Err(PostingError::InvalidPayroll(_))
        ));
    }

    #[test]
    fn test_expense_on_credit_with_override() {
        let chart = chart();
        let stationery = AccountId::new();
        let event = PostingEvent::ExpenseRecorded {
            date: date(),
            description: "Chalk and markers".into(),
            amount: Amount::new(12_500),
            expense_account: Some(stationery),
            payment: ExpensePayment::OnCredit,
            reference: None,
        };
        let entry = PostingRules::prepare(&event, &chart).unwrap();
        assert_eq!(entry.description, "Chalk and markers");
        assert_eq!(entry.lines[0].account_id, stationery);
        assert_eq!(
            line_for(&entry, &chart, SystemAccount::AccountsPayable).credit,
            Amount::new(12_500)
        );
    }

    #[test]
    fn test_wallet_flows() {
        let chart = chart();
        let student_id = StudentId::new();

        let top_up = PostingRules::prepare(
            &PostingEvent::WalletTopUp {
                student_id,
                date: date(),
                amount: Amount::new(5_000),
                method: PaymentMethod::Cash,
            },
            &chart,
        )
        .unwrap();
        assert_eq!(
            line_for(&top_up, &chart, SystemAccount::StudentWallet).credit,
            Amount::new(5_000)
        );

        let spend = PostingRules::prepare(
            &PostingEvent::WalletSpend {
                student_id,
                date: date(),
                amount: Amount::new(1_200),
                description: Some("Cafeteria".into()),
            },
            &chart,
        )
        .unwrap();
        assert_eq!(
            line_for(&spend, &chart, SystemAccount::WalletRevenue).credit,
            Amount::new(1_200)
        );

        let refund = PostingRules::prepare(
            &PostingEvent::WalletRefund {
                student_id,
                date: date(),
                amount: Amount::new(3_800),
                method: PaymentMethod::Cash,
            },
            &chart,
        )
        .unwrap();
        assert_eq!(line_for(&refund, &chart, SystemAccount::Cash).credit, Amount::new(3_800));
        assert_eq!(refund.source, JournalSource::Wallet);
    }

    #[test]
    fn test_missing_account_is_reported() {
        let mut resolver = MockAccountResolver::new();
        resolver
            .expect_resolve()
            .returning(|role| (role != SystemAccount::StudentWallet).then(AccountId::new));

        let event = PostingEvent::WalletTopUp {
            student_id: StudentId::new(),
            date: date(),
            amount: Amount::new(5_000),
            method: PaymentMethod::Bank,
        };
        assert_eq!(
            PostingRules::prepare(&event, &resolver),
            Err(PostingError::MissingAccount(SystemAccount::StudentWallet))
        );
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let event = PostingEvent::WalletSpend {
            student_id: StudentId::new(),
            date: date(),
            amount: Amount::ZERO,
            description: None,
        };
        assert_eq!(
            PostingRules::prepare(&event, &chart()),
            Err(PostingError::InvalidAmount(Amount::ZERO))
        );
    }

    #[test]
    fn test_into_new_entry_posts() {
        let school_id = SchoolId::new();
        let event = PostingEvent::WalletTopUp {
            student_id: StudentId::new(),
            date: date(),
            amount: Amount::new(5_000),
            method: PaymentMethod::Bank,
        };
        let entry = PostingRules::prepare(&event, &chart())
            .unwrap()
            .into_new_entry(school_id);
        assert!(entry.post);
        assert_eq!(entry.school_id, school_id);
    }
}
