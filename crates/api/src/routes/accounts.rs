//! Chart of accounts, balances and the trial balance.

use axum::{
    Router,
    extract::State,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use scholaris_core::ledger::AccountType;
use scholaris_db::AccountRepository;
use scholaris_db::repositories::{AccountFilter, CreateAccountInput, UpdateAccountInput};

use super::{as_of_or_today, nullable};
use crate::AppState;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Tenant};
use crate::response::{ApiResult, created, deleted, ok};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school_id}/accounts", get(list_accounts).post(create_account))
        .route(
            "/schools/{school_id}/accounts/{account_id}",
            get(get_account).patch(update_account).delete(delete_account),
        )
        .route("/schools/{school_id}/accounts/{account_id}/balance", get(get_balance))
        .route("/schools/{school_id}/trial-balance", get(trial_balance))
}

/// Query parameters for listing accounts.
#[derive(Debug, Deserialize)]
pub struct ListAccountsQuery {
    /// Filter by account type.
    #[serde(rename = "type")]
    pub account_type: Option<AccountType>,
    /// Filter by active status.
    pub active: Option<bool>,
}

/// `?as_of=YYYY-MM-DD`.
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    /// Inclusive date; today when absent.
    pub as_of: Option<NaiveDate>,
}

/// Request body for creating an account.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    /// Account code, unique within the school.
    #[validate(length(min = 1, max = 20, message = "must be 1 to 20 characters"))]
    pub code: String,
    /// Account name.
    #[validate(length(min = 1, max = 255, message = "must be 1 to 255 characters"))]
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Classification.
    pub account_type: AccountType,
}

/// Request body for updating an account.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountRequest {
    /// New code.
    pub code: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New description; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// New type, only while the account has no lines.
    pub account_type: Option<AccountType>,
    /// Activate or deactivate.
    pub is_active: Option<bool>,
}

/// GET `/schools/{school_id}/accounts`.
async fn list_accounts(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<ListAccountsQuery>,
) -> ApiResult {
    let filter = AccountFilter {
        account_type: query.account_type,
        is_active: query.active,
    };
    ok(AccountRepository::new(state.conn())
        .list_accounts(tenant.id(), filter)
        .await?)
}

/// POST `/schools/{school_id}/accounts`.
async fn create_account(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateAccountRequest>,
) -> ApiResult {
    payload.validate()?;
    let account = AccountRepository::new(state.conn())
        .create_account(CreateAccountInput {
            school_id: tenant.id(),
            code: payload.code,
            name: payload.name,
            description: payload.description,
            account_type: payload.account_type,
            is_system: false,
        })
        .await?;
    created(account)
}

/// GET `/schools/{school_id}/accounts/{account_id}`.
async fn get_account(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, account_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(AccountRepository::new(state.conn())
        .get_account(tenant.id(), account_id)
        .await?)
}

/// PATCH `/schools/{school_id}/accounts/{account_id}`.
async fn update_account(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, account_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateAccountRequest>,
) -> ApiResult {
    let input = UpdateAccountInput {
        code: payload.code,
        name: payload.name,
        description: payload.description,
        account_type: payload.account_type,
        is_active: payload.is_active,
    };
    ok(AccountRepository::new(state.conn())
        .update_account(tenant.id(), account_id, input)
        .await?)
}

/// DELETE `/schools/{school_id}/accounts/{account_id}` - Only for accounts
/// without ledger lines; deactivate the others.
async fn delete_account(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, account_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    AccountRepository::new(state.conn())
        .delete_account(tenant.id(), account_id)
        .await?;
    deleted()
}

/// GET `/schools/{school_id}/accounts/{account_id}/balance?as_of=`.
async fn get_balance(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, account_id)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(query): ApiQuery<AsOfQuery>,
) -> ApiResult {
    ok(AccountRepository::new(state.conn())
        .balance_as_of(tenant.id(), account_id, as_of_or_today(query.as_of))
        .await?)
}

/// GET `/schools/{school_id}/trial-balance?as_of=`.
async fn trial_balance(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<AsOfQuery>,
) -> ApiResult {
    ok(AccountRepository::new(state.conn())
        .trial_balance(tenant.id(), as_of_or_today(query.as_of))
        .await?)
}
