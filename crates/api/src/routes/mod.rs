//! API route definitions.
//!
//! Everything below `/schools/{school_id}` takes a [`crate::extractors::Tenant`],
//! so an unknown school is a 404 before any handler runs.

use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use scholaris_shared::types::PageRequest;

use crate::AppState;

pub mod accounts;
pub mod classes;
pub mod dashboard;
pub mod exams;
pub mod fiscal;
pub mod health;
pub mod journal;
pub mod postings;
pub mod results;
pub mod schools;
pub mod teachers;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(schools::routes())
        .merge(accounts::routes())
        .merge(fiscal::routes())
        .merge(journal::routes())
        .merge(postings::routes())
        .merge(teachers::routes())
        .merge(classes::routes())
        .merge(results::routes())
        .merge(exams::routes())
        .merge(dashboard::routes())
}

/// `page` and `per_page` query parameters, clamped.
pub(crate) fn page_request(page: Option<u32>, per_page: Option<u32>) -> PageRequest {
    let defaults = PageRequest::default();
    PageRequest::new(page.unwrap_or(defaults.page), per_page.unwrap_or(defaults.per_page))
}

/// `as_of` query parameter, defaulting to today.
pub(crate) fn as_of_or_today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Utc::now().date_naive())
}

/// Tells an absent field (`None`) from an explicit `null` (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
