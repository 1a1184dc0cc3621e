//! Journal entry routes: drafts, posting and reversal.

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use scholaris_core::ledger::{JournalLine, JournalSource, NewJournalEntry};
use scholaris_db::JournalRepository;
use scholaris_db::repositories::{JournalFilter, UpdateDraftInput};
use scholaris_shared::types::SchoolId;

use super::{nullable, page_request};
use crate::AppState;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Tenant};
use crate::response::{ApiResult, created, deleted, ok};

/// Creates the journal entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/schools/{school_id}/journal-entries",
            get(list_entries).post(create_entry),
        )
        .route(
            "/schools/{school_id}/journal-entries/{entry_id}",
            get(get_entry).patch(update_draft).delete(delete_entry),
        )
        .route("/schools/{school_id}/journal-entries/{entry_id}/post", post(post_entry))
        .route(
            "/schools/{school_id}/journal-entries/{entry_id}/reverse",
            post(reverse_entry),
        )
}

/// Query parameters for listing entries.
#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    /// Entries on or after this date.
    pub from: Option<NaiveDate>,
    /// Entries on or before this date.
    pub to: Option<NaiveDate>,
    /// Producing module.
    pub source: Option<JournalSource>,
    /// Posted or draft only.
    pub posted: Option<bool>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (max 100).
    pub per_page: Option<u32>,
}

/// Request body for a manual entry.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Narrative.
    #[validate(length(min = 1, max = 500, message = "must be 1 to 500 characters"))]
    pub description: String,
    /// External reference.
    pub reference: Option<String>,
    /// Debit and credit lines; amounts in minor units.
    #[validate(length(min = 2, message = "needs at least two lines"))]
    pub lines: Vec<JournalLine>,
    /// Post straight away instead of saving a draft.
    #[serde(default)]
    pub post: bool,
}

/// Request body for editing a draft.
#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    /// New narrative.
    pub description: Option<String>,
    /// New reference; `null` clears it.
    #[serde(default, deserialize_with = "nullable")]
    pub reference: Option<Option<String>>,
}

/// Request body for reversing a posted entry.
#[derive(Debug, Deserialize, Validate)]
pub struct ReverseEntryRequest {
    /// Why the entry is reversed.
    #[validate(length(min = 1, max = 500, message = "must be 1 to 500 characters"))]
    pub reason: String,
    /// Reversal date; the original date when absent.
    pub date: Option<NaiveDate>,
}

fn journal(state: &AppState) -> JournalRepository {
    JournalRepository::with_settings(state.conn(), state.ledger.clone())
}

/// GET `/schools/{school_id}/journal-entries`.
async fn list_entries(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<ListEntriesQuery>,
) -> ApiResult {
    let filter = JournalFilter {
        date_from: query.from,
        date_to: query.to,
        source: query.source,
        is_posted: query.posted,
    };
    let page = page_request(query.page, query.per_page);
    ok(journal(&state).list_entries(tenant.id(), filter, page).await?)
}

/// POST `/schools/{school_id}/journal-entries` - Saves a draft, or posts it
/// when `post` is true.
async fn create_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateEntryRequest>,
) -> ApiResult {
    payload.validate()?;
    let entry = journal(&state)
        .create_entry(NewJournalEntry {
            school_id: SchoolId::from_uuid(tenant.id()),
            entry_date: payload.entry_date,
            description: payload.description,
            reference: payload.reference,
            source: JournalSource::Manual,
            lines: payload.lines,
            post: payload.post,
        })
        .await?;
    created(entry)
}

/// GET `/schools/{school_id}/journal-entries/{entry_id}`.
async fn get_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, entry_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(journal(&state).get_entry(tenant.id(), entry_id).await?)
}

/// PATCH `/schools/{school_id}/journal-entries/{entry_id}` - Drafts only.
async fn update_draft(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, entry_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateDraftRequest>,
) -> ApiResult {
    let input = UpdateDraftInput {
        description: payload.description,
        reference: payload.reference,
    };
    ok(journal(&state).update_draft(tenant.id(), entry_id, input).await?)
}

/// DELETE `/schools/{school_id}/journal-entries/{entry_id}` - Drafts only.
async fn delete_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, entry_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    journal(&state).delete_entry(tenant.id(), entry_id).await?;
    deleted()
}

/// POST `/schools/{school_id}/journal-entries/{entry_id}/post`.
async fn post_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, entry_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(journal(&state).post_entry(tenant.id(), entry_id).await?)
}

/// POST `/schools/{school_id}/journal-entries/{entry_id}/reverse`.
async fn reverse_entry(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, entry_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<ReverseEntryRequest>,
) -> ApiResult {
    payload.validate()?;
    let reversal = journal(&state)
        .reverse_entry(tenant.id(), entry_id, payload.reason.trim(), payload.date)
        .await?;
    created(reversal)
}
