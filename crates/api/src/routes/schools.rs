//! School registration and lookup.

use axum::{
    Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use validator::Validate;

use scholaris_db::repositories::CreateSchoolInput;
use scholaris_db::{AccountRepository, SchoolRepository};

use crate::AppState;
use crate::extractors::{ApiJson, Tenant};
use crate::response::{ApiResult, created, ok};

/// Creates the school routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools", get(list_schools).post(create_school))
        .route("/schools/{school_id}", get(get_school))
}

/// Request body for registering a school.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSchoolRequest {
    /// Display name.
    #[validate(length(min = 1, max = 200, message = "must be 1 to 200 characters"))]
    pub name: String,
    /// URL-safe unique slug.
    #[validate(length(min = 2, max = 63, message = "must be 2 to 63 characters"))]
    pub slug: String,
    /// ISO 4217 currency code.
    #[validate(length(equal = 3, message = "must be a 3-letter code"))]
    pub currency: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// POST `/schools` - Registers a school and seeds its standard chart of accounts.
async fn create_school(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSchoolRequest>,
) -> ApiResult {
    payload.validate()?;

    let school = SchoolRepository::new(state.conn())
        .create(CreateSchoolInput {
            name: payload.name,
            slug: payload.slug,
            currency: payload.currency,
            address: payload.address,
        })
        .await?;
    let accounts = AccountRepository::new(state.conn())
        .seed_system_accounts(school.id)
        .await?;

    info!(school_id = %school.id, accounts = accounts.len(), "School registered");
    created(json!({ "school": school, "accounts": accounts }))
}

/// GET `/schools` - Lists active schools.
async fn list_schools(State(state): State<AppState>) -> ApiResult {
    ok(SchoolRepository::new(state.conn()).list_active().await?)
}

/// GET `/schools/{school_id}`.
async fn get_school(tenant: Tenant) -> ApiResult {
    ok(tenant.school)
}
