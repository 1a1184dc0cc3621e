//! School dashboard.

use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;

use scholaris_db::DashboardRepository;

use super::as_of_or_today;
use crate::AppState;
use crate::extractors::{ApiQuery, Tenant};
use crate::response::{ApiResult, ok};

/// Creates the dashboard routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/schools/{school_id}/dashboard", get(get_dashboard))
}

/// `?as_of=YYYY-MM-DD`.
#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Day the figures are taken on; today when absent.
    pub as_of: Option<NaiveDate>,
}

/// GET `/schools/{school_id}/dashboard` - Head counts, finance figures for
/// the current fiscal year and the latest journal entries.
async fn get_dashboard(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<DashboardQuery>,
) -> ApiResult {
    ok(DashboardRepository::new(state.conn())
        .summary(tenant.id(), as_of_or_today(query.as_of))
        .await?)
}
