//! Business events posted straight to the ledger.
//!
//! Each route builds a [`PostingEvent`]; the posting rules turn it into a
//! balanced, posted journal entry against the school's standard accounts.

use axum::{Router, extract::State, routing::post};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use scholaris_core::posting::{ExpensePayment, FeeItem, PaymentMethod, PostingEvent};
use scholaris_db::PostingRepository;
use scholaris_shared::types::{AccountId, Amount, StudentId};

use crate::AppState;
use crate::extractors::{ApiJson, Tenant};
use crate::response::{ApiResult, created};

/// Creates the posting routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school_id}/postings/fee-invoices", post(fee_invoice))
        .route("/schools/{school_id}/postings/fee-payments", post(fee_payment))
        .route("/schools/{school_id}/postings/payroll", post(payroll))
        .route("/schools/{school_id}/postings/expenses", post(expense))
        .route("/schools/{school_id}/postings/wallet-top-ups", post(wallet_top_up))
        .route("/schools/{school_id}/postings/wallet-spends", post(wallet_spend))
        .route("/schools/{school_id}/postings/wallet-refunds", post(wallet_refund))
}

/// Fees billed to a student.
#[derive(Debug, Deserialize)]
pub struct FeeInvoiceRequest {
    /// Billed student.
    pub student_id: Uuid,
    /// Invoice date.
    pub date: NaiveDate,
    /// Billed items.
    pub items: Vec<FeeItem>,
    /// Invoice number.
    pub reference: Option<String>,
}

/// Fees paid by a student.
#[derive(Debug, Deserialize)]
pub struct FeePaymentRequest {
    /// Paying student.
    pub student_id: Uuid,
    /// Payment date.
    pub date: NaiveDate,
    /// Amount received.
    pub amount: Amount,
    /// Cash or bank.
    pub method: PaymentMethod,
    /// Receipt number.
    pub reference: Option<String>,
}

/// A month's salaries.
#[derive(Debug, Deserialize)]
pub struct PayrollRequest {
    /// Payment date.
    pub date: NaiveDate,
    /// Pay period label, e.g. "2024-10".
    pub period: String,
    /// Total gross pay.
    pub gross: Amount,
    /// Income tax withheld.
    #[serde(default)]
    pub tax: Amount,
    /// Pension withheld.
    #[serde(default)]
    pub pension: Amount,
    /// Other withholdings.
    #[serde(default)]
    pub other_deductions: Amount,
    /// How net pay leaves the school.
    pub method: PaymentMethod,
}

/// An operating expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseRequest {
    /// Expense date.
    pub date: NaiveDate,
    /// What was bought.
    pub description: String,
    /// Amount spent.
    pub amount: Amount,
    /// Expense account; general expenses when absent.
    pub expense_account_id: Option<Uuid>,
    /// Cash, bank or on credit.
    pub payment: ExpensePayment,
    /// Supplier invoice number.
    pub reference: Option<String>,
}

/// Money moving into or out of a student wallet.
#[derive(Debug, Deserialize)]
pub struct WalletMovementRequest {
    /// Wallet owner.
    pub student_id: Uuid,
    /// Movement date.
    pub date: NaiveDate,
    /// Amount moved.
    pub amount: Amount,
    /// Cash or bank.
    pub method: PaymentMethod,
}

/// A purchase paid from a student wallet.
#[derive(Debug, Deserialize)]
pub struct WalletSpendRequest {
    /// Wallet owner.
    pub student_id: Uuid,
    /// Purchase date.
    pub date: NaiveDate,
    /// Amount spent.
    pub amount: Amount,
    /// What was bought.
    pub description: Option<String>,
}

async fn record(state: &AppState, tenant: &Tenant, event: PostingEvent) -> ApiResult {
    let entry = PostingRepository::new(state.conn(), state.ledger.clone())
        .post_event(tenant.id(), event)
        .await?;
    created(entry)
}

/// POST `/schools/{school_id}/postings/fee-invoices`.
async fn fee_invoice(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<FeeInvoiceRequest>,
) -> ApiResult {
    let event = PostingEvent::FeeInvoiced {
        student_id: StudentId::from_uuid(payload.student_id),
        date: payload.date,
        items: payload.items,
        reference: payload.reference,
    };
    record(&state, &tenant, event).await
}

/// POST `/schools/{school_id}/postings/fee-payments`.
async fn fee_payment(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<FeePaymentRequest>,
) -> ApiResult {
    let event = PostingEvent::FeePaymentReceived {
        student_id: StudentId::from_uuid(payload.student_id),
        date: payload.date,
        amount: payload.amount,
        method: payload.method,
        reference: payload.reference,
    };
    record(&state, &tenant, event).await
}

/// POST `/schools/{school_id}/postings/payroll`.
async fn payroll(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<PayrollRequest>,
) -> ApiResult {
    let event = PostingEvent::PayrollRun {
        date: payload.date,
        period: payload.period,
        gross: payload.gross,
        tax: payload.tax,
        pension: payload.pension,
        other_deductions: payload.other_deductions,
        method: payload.method,
    };
    record(&state, &tenant, event).await
}

/// POST `/schools/{school_id}/postings/expenses`.
async fn expense(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<ExpenseRequest>,
) -> ApiResult {
    let event = PostingEvent::ExpenseRecorded {
        date: payload.date,
        description: payload.description,
        amount: payload.amount,
        expense_account: payload.expense_account_id.map(AccountId::from_uuid),
        payment: payload.payment,
        reference: payload.reference,
    };
    record(&state, &tenant, event).await
}

/// POST `/schools/{school_id}/postings/wallet-top-ups`.
async fn wallet_top_up(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<WalletMovementRequest>,
) -> ApiResult {
    let event = PostingEvent::WalletTopUp {
        student_id: StudentId::from_uuid(payload.student_id),
        date: payload.date,
        amount: payload.amount,
        method: payload.method,
    };
    record(&state, &tenant, event).await
}

/// POST `/schools/{school_id}/postings/wallet-spends`.
async fn wallet_spend(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<WalletSpendRequest>,
) -> ApiResult {
    let event = PostingEvent::WalletSpend {
        student_id: StudentId::from_uuid(payload.student_id),
        date: payload.date,
        amount: payload.amount,
        description: payload.description,
    };
    record(&state, &tenant, event).await
}

/// POST `/schools/{school_id}/postings/wallet-refunds`.
async fn wallet_refund(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<WalletMovementRequest>,
) -> ApiResult {
    let event = PostingEvent::WalletRefund {
        student_id: StudentId::from_uuid(payload.student_id),
        date: payload.date,
        amount: payload.amount,
        method: payload.method,
    };
    record(&state, &tenant, event).await
}
