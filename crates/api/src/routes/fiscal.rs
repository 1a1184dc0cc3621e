//! Fiscal year management routes.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use scholaris_db::FiscalRepository;
use scholaris_db::repositories::CreateFiscalYearInput;

use crate::AppState;
use crate::extractors::{ApiJson, ApiPath, Tenant};
use crate::response::{ApiResult, created, ok};

/// Creates the fiscal routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schools/{school_id}/fiscal-years",
            get(list_fiscal_years).post(create_fiscal_year),
        )
        .route("/schools/{school_id}/fiscal-years/{fiscal_year_id}", get(get_fiscal_year))
        .route(
            "/schools/{school_id}/fiscal-years/{fiscal_year_id}/current",
            post(set_current),
        )
        .route(
            "/schools/{school_id}/fiscal-years/{fiscal_year_id}/close",
            post(close_fiscal_year),
        )
}

/// Request body for creating a fiscal year.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateFiscalYearRequest {
    /// Name, e.g. "2024/2025".
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub name: String,
    /// First day (YYYY-MM-DD).
    pub start_date: NaiveDate,
    /// Last day (YYYY-MM-DD).
    pub end_date: NaiveDate,
    /// Make this the current year.
    #[serde(default)]
    pub is_current: bool,
}

/// GET `/schools/{school_id}/fiscal-years` - Newest first.
async fn list_fiscal_years(State(state): State<AppState>, tenant: Tenant) -> ApiResult {
    ok(FiscalRepository::new(state.conn())
        .list_fiscal_years(tenant.id())
        .await?)
}

/// POST `/schools/{school_id}/fiscal-years`.
async fn create_fiscal_year(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateFiscalYearRequest>,
) -> ApiResult {
    payload.validate()?;
    let year = FiscalRepository::new(state.conn())
        .create_fiscal_year(CreateFiscalYearInput {
            school_id: tenant.id(),
            name: payload.name,
            start_date: payload.start_date,
            end_date: payload.end_date,
            is_current: payload.is_current,
        })
        .await?;
    created(year)
}

/// GET `/schools/{school_id}/fiscal-years/{fiscal_year_id}`.
async fn get_fiscal_year(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, fiscal_year_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(FiscalRepository::new(state.conn())
        .get_fiscal_year(tenant.id(), fiscal_year_id)
        .await?)
}

/// POST `/schools/{school_id}/fiscal-years/{fiscal_year_id}/current`.
async fn set_current(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, fiscal_year_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(FiscalRepository::new(state.conn())
        .set_current(tenant.id(), fiscal_year_id)
        .await?)
}

/// POST `/schools/{school_id}/fiscal-years/{fiscal_year_id}/close` - Refused
/// while draft entries remain in the year.
async fn close_fiscal_year(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, fiscal_year_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(FiscalRepository::new(state.conn())
        .close(tenant.id(), fiscal_year_id)
        .await?)
}
