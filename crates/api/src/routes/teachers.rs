//! Teacher records and the step-by-step profile wizard.

use axum::{
    Router,
    extract::State,
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use scholaris_core::teachers::{
    PersonalDetails, ProfileStep, TeacherProfile, TeacherStatus, WizardStep,
};
use scholaris_db::TeacherRepository;
use scholaris_db::repositories::{TeacherError, TeacherFilter, UpdateTeacherInput};

use super::page_request;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Tenant};
use crate::response::{ApiResult, created, deleted, ok};
use crate::{ApiError, AppState};

/// Creates the teacher routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school_id}/teachers", get(list_teachers).post(create_teacher))
        .route("/schools/{school_id}/teachers/wizard", post(start_wizard))
        .route(
            "/schools/{school_id}/teachers/{teacher_id}",
            get(get_teacher).patch(update_teacher).delete(delete_teacher),
        )
        .route(
            "/schools/{school_id}/teachers/{teacher_id}/wizard/finish",
            post(finish_wizard),
        )
        .route(
            "/schools/{school_id}/teachers/{teacher_id}/wizard/{step}",
            put(save_step),
        )
}

/// Query parameters for listing teachers.
#[derive(Debug, Deserialize)]
pub struct ListTeachersQuery {
    /// Matches first name, last name or email.
    pub search: Option<String>,
    /// Filter by status.
    pub status: Option<TeacherStatus>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (max 100).
    pub per_page: Option<u32>,
}

/// Request body for editing a finished teacher.
#[derive(Debug, Deserialize)]
pub struct UpdateTeacherRequest {
    /// Replacement profile.
    pub profile: Option<TeacherProfile>,
    /// New status.
    pub status: Option<TeacherStatus>,
}

/// Reads the body of a wizard step according to the step in the path.
fn step_from_body(step: WizardStep, body: Value) -> Result<ProfileStep, ApiError> {
    let parsed = match step {
        WizardStep::Personal => serde_json::from_value(body).map(ProfileStep::Personal),
        WizardStep::Contact => serde_json::from_value(body).map(ProfileStep::Contact),
        WizardStep::Qualifications => serde_json::from_value(body).map(ProfileStep::Qualifications),
        WizardStep::Employment => serde_json::from_value(body).map(ProfileStep::Employment),
    };
    parsed.map_err(|e| ApiError::validation(format!("Invalid {step} step: {e}")))
}

/// GET `/schools/{school_id}/teachers`.
async fn list_teachers(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<ListTeachersQuery>,
) -> ApiResult {
    let filter = TeacherFilter {
        search: query.search,
        status: query.status,
    };
    let page = page_request(query.page, query.per_page);
    ok(TeacherRepository::new(state.conn())
        .list(tenant.id(), filter, page)
        .await?)
}

/// POST `/schools/{school_id}/teachers` - Creates an active teacher from a
/// complete profile in one request.
async fn create_teacher(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(profile): ApiJson<TeacherProfile>,
) -> ApiResult {
    created(TeacherRepository::new(state.conn())
        .create(tenant.id(), profile)
        .await?)
}

/// GET `/schools/{school_id}/teachers/{teacher_id}`.
async fn get_teacher(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, teacher_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(TeacherRepository::new(state.conn())
        .get(tenant.id(), teacher_id)
        .await?)
}

/// PATCH `/schools/{school_id}/teachers/{teacher_id}`.
async fn update_teacher(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, teacher_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateTeacherRequest>,
) -> ApiResult {
    let input = UpdateTeacherInput {
        profile: payload.profile,
        status: payload.status,
    };
    ok(TeacherRepository::new(state.conn())
        .update(tenant.id(), teacher_id, input)
        .await?)
}

/// DELETE `/schools/{school_id}/teachers/{teacher_id}`.
async fn delete_teacher(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, teacher_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    TeacherRepository::new(state.conn())
        .delete(tenant.id(), teacher_id)
        .await?;
    deleted()
}

/// POST `/schools/{school_id}/teachers/wizard` - Step 1; creates a draft.
async fn start_wizard(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(personal): ApiJson<PersonalDetails>,
) -> ApiResult {
    created(TeacherRepository::new(state.conn())
        .start_wizard(tenant.id(), personal)
        .await?)
}

/// PUT `/schools/{school_id}/teachers/{teacher_id}/wizard/{step}` - `step`
/// is a name (`contact`) or a number (`2`).
async fn save_step(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, teacher_id, step)): ApiPath<(Uuid, Uuid, String)>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult {
    let step: WizardStep = step.parse().map_err(TeacherError::from)?;
    let step = step_from_body(step, body)?;
    ok(TeacherRepository::new(state.conn())
        .save_step(tenant.id(), teacher_id, step)
        .await?)
}

/// POST `/schools/{school_id}/teachers/{teacher_id}/wizard/finish`.
async fn finish_wizard(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, teacher_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(TeacherRepository::new(state.conn())
        .finish_wizard(tenant.id(), teacher_id)
        .await?)
}
