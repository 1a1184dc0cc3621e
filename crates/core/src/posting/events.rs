//! Business events that produce journal entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use scholaris_shared::types::{AccountId, Amount, StudentId};

use super::accounts::SystemAccount;
use crate::ledger::JournalSource;

/// How money moved in or out of the school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash over the counter.
    Cash,
    /// Transfer, card or cheque through the bank.
    Bank,
}

impl PaymentMethod {
    /// Account that receives or pays out the money.
    #[must_use]
    pub const fn account(self) -> SystemAccount {
        match self {
            Self::Cash => SystemAccount::Cash,
            Self::Bank => SystemAccount::Bank,
        }
    }
}

/// How an expense was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpensePayment {
    /// Paid in cash.
    Cash,
    /// Paid from the bank.
    Bank,
    /// Owed to the supplier.
    OnCredit,
}

impl ExpensePayment {
    /// Account credited for the expense.
    #[must_use]
    pub const fn account(self) -> SystemAccount {
        match self {
            Self::Cash => SystemAccount::Cash,
            Self::Bank => SystemAccount::Bank,
            Self::OnCredit => SystemAccount::AccountsPayable,
        }
    }
}

/// Revenue category of a fee item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    /// Tuition.
    Tuition,
    /// Uniform, books, transport and other charges.
    Other,
}

impl FeeKind {
    /// Revenue account credited for this kind.
    #[must_use]
    pub const fn revenue_account(self) -> SystemAccount {
        match self {
            Self::Tuition => SystemAccount::TuitionRevenue,
            Self::Other => SystemAccount::OtherFeeRevenue,
        }
    }
}

/// A single billable line on a fee invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeItem {
    /// Revenue category.
    pub kind: FeeKind,
    /// What is being billed, e.g. "Term 1 tuition".
    pub description: String,
    /// Amount in minor units.
    pub amount: Amount,
}

/// A business event that must be recorded in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PostingEvent {
    /// Fees billed to a student.
    FeeInvoiced {
        /// Billed student.
        student_id: StudentId,
        /// Invoice date.
        date: NaiveDate,
        /// Billable items.
        items: Vec<FeeItem>,
        /// Invoice number.
        reference: Option<String>,
    },
    /// A student paid fees.
    FeePaymentReceived {
        /// Paying student.
        student_id: StudentId,
        /// Payment date.
        date: NaiveDate,
        /// Amount received.
        amount: Amount,
        /// Cash or bank.
        method: PaymentMethod,
        /// Receipt number.
        reference: Option<String>,
    },
    /// Salaries for a pay period.
    PayrollRun {
        /// Payment date.
        date: NaiveDate,
        /// Pay period label, e.g. "2025-01".
        period: String,
        /// Gross salaries.
        gross: Amount,
        /// Income tax withheld.
        tax: Amount,
        /// Pension withheld.
        pension: Amount,
        /// Other deductions (loans, union dues).
        other_deductions: Amount,
        /// How net pay left the school.
        method: PaymentMethod,
    },
    /// An operating expense.
    ExpenseRecorded {
        /// Expense date.
        date: NaiveDate,
        /// What was bought.
        description: String,
        /// Amount spent.
        amount: Amount,
        /// Expense account to charge instead of the general expense account.
        expense_account: Option<AccountId>,
        /// How it was settled.
        payment: ExpensePayment,
        /// Supplier invoice or voucher number.
        reference: Option<String>,
    },
    /// Money loaded into a student wallet.
    WalletTopUp {
        /// Wallet owner.
        student_id: StudentId,
        /// Top-up date.
        date: NaiveDate,
        /// Amount loaded.
        amount: Amount,
        /// Cash or bank.
        method: PaymentMethod,
    },
    /// A purchase paid from a student wallet.
    WalletSpend {
        /// Wallet owner.
        student_id: StudentId,
        /// Purchase date.
        date: NaiveDate,
        /// Amount spent.
        amount: Amount,
        /// What was bought.
        description: Option<String>,
    },
    /// Wallet money handed back to the student.
    WalletRefund {
        /// Wallet owner.
        student_id: StudentId,
        /// Refund date.
        date: NaiveDate,
        /// Amount refunded.
        amount: Amount,
        /// Cash or bank.
        method: PaymentMethod,
    },
}

impl PostingEvent {
    /// Accounting date of the event.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::FeeInvoiced { date, .. }
            | Self::FeePaymentReceived { date, .. }
            | Self::PayrollRun { date, .. }
            | Self::ExpenseRecorded { date, .. }
            | Self::WalletTopUp { date, .. }
            | Self::WalletSpend { date, .. }
            | Self::WalletRefund { date, .. } => *date,
        }
    }

    /// Module that owns the resulting entry.
    #[must_use]
    pub const fn source(&self) -> JournalSource {
        match self {
            Self::FeeInvoiced { .. } | Self::FeePaymentReceived { .. } => JournalSource::Fees,
            Self::PayrollRun { .. } => JournalSource::Payroll,
            Self::ExpenseRecorded { .. } => JournalSource::Expense,
            Self::WalletTopUp { .. } | Self::WalletSpend { .. } | Self::WalletRefund { .. } => {
                JournalSource::Wallet
            }
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::FeeInvoiced { .. } => "fee_invoiced",
            Self::FeePaymentReceived { .. } => "fee_payment_received",
            Self::PayrollRun { .. } => "payroll_run",
            Self::ExpenseRecorded { .. } => "expense_recorded",
            Self::WalletTopUp { .. } => "wallet_top_up",
            Self::WalletSpend { .. } => "wallet_spend",
            Self::WalletRefund { .. } => "wallet_refund",
        }
    }
}
