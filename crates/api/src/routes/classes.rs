//! Classes and the students enrolled in them.

use axum::{Router, extract::State, routing::get};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use scholaris_core::teachers::Gender;
use scholaris_db::repositories::{CreateClassInput, CreateStudentInput, UpdateClassInput};
use scholaris_db::{ClassRepository, StudentRepository};

use super::nullable;
use crate::AppState;
use crate::extractors::{ApiJson, ApiPath, Tenant};
use crate::response::{ApiResult, created, deleted, ok};

/// Creates the class routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school_id}/classes", get(list_classes).post(create_class))
        .route(
            "/schools/{school_id}/classes/{class_id}",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route(
            "/schools/{school_id}/classes/{class_id}/students",
            get(list_students).post(enrol_student),
        )
        .route("/schools/{school_id}/students/{student_id}", get(get_student))
}

/// Request body for creating a class.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateClassRequest {
    /// Display name, e.g. "JSS 1A".
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub name: String,
    /// Level, e.g. "JSS1".
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub level: String,
    /// Class teacher.
    pub class_teacher_id: Option<Uuid>,
    /// Maximum number of students.
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub capacity: Option<i32>,
}

/// Request body for updating a class.
#[derive(Debug, Deserialize)]
pub struct UpdateClassRequest {
    /// New name.
    pub name: Option<String>,
    /// New level.
    pub level: Option<String>,
    /// New class teacher; `null` removes it.
    #[serde(default, deserialize_with = "nullable")]
    pub class_teacher_id: Option<Option<Uuid>>,
    /// New capacity; `null` removes the limit.
    #[serde(default, deserialize_with = "nullable")]
    pub capacity: Option<Option<i32>>,
}

/// Request body for enrolling a student.
#[derive(Debug, Deserialize, Validate)]
pub struct EnrolStudentRequest {
    /// School-issued admission number.
    #[validate(length(min = 1, max = 50, message = "must be 1 to 50 characters"))]
    pub admission_number: String,
    /// Given name.
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub first_name: String,
    /// Family name.
    #[validate(length(min = 1, max = 100, message = "must be 1 to 100 characters"))]
    pub last_name: String,
    /// Gender.
    pub gender: Gender,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
}

/// GET `/schools/{school_id}/classes`.
async fn list_classes(State(state): State<AppState>, tenant: Tenant) -> ApiResult {
    ok(ClassRepository::new(state.conn()).list(tenant.id()).await?)
}

/// POST `/schools/{school_id}/classes`.
async fn create_class(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<CreateClassRequest>,
) -> ApiResult {
    payload.validate()?;
    let input = CreateClassInput {
        name: payload.name,
        level: payload.level,
        class_teacher_id: payload.class_teacher_id,
        capacity: payload.capacity,
    };
    created(ClassRepository::new(state.conn())
        .create(tenant.id(), input)
        .await?)
}

/// GET `/schools/{school_id}/classes/{class_id}`.
async fn get_class(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, class_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(ClassRepository::new(state.conn())
        .get(tenant.id(), class_id)
        .await?)
}

/// PATCH `/schools/{school_id}/classes/{class_id}`.
async fn update_class(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, class_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateClassRequest>,
) -> ApiResult {
    let input = UpdateClassInput {
        name: payload.name,
        level: payload.level,
        class_teacher_id: payload.class_teacher_id,
        capacity: payload.capacity,
    };
    ok(ClassRepository::new(state.conn())
        .update(tenant.id(), class_id, input)
        .await?)
}

/// DELETE `/schools/{school_id}/classes/{class_id}` - Empty classes only.
async fn delete_class(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, class_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ClassRepository::new(state.conn())
        .delete(tenant.id(), class_id)
        .await?;
    deleted()
}

/// GET `/schools/{school_id}/classes/{class_id}/students`.
async fn list_students(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, class_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(StudentRepository::new(state.conn())
        .list_by_class(tenant.id(), class_id)
        .await?)
}

/// POST `/schools/{school_id}/classes/{class_id}/students`.
async fn enrol_student(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, class_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<EnrolStudentRequest>,
) -> ApiResult {
    payload.validate()?;
    let input = CreateStudentInput {
        class_id: Some(class_id),
        admission_number: payload.admission_number,
        first_name: payload.first_name,
        last_name: payload.last_name,
        gender: payload.gender,
        date_of_birth: payload.date_of_birth,
    };
    created(StudentRepository::new(state.conn())
        .create(tenant.id(), input)
        .await?)
}

/// GET `/schools/{school_id}/students/{student_id}`.
async fn get_student(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, student_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(StudentRepository::new(state.conn())
        .get(tenant.id(), student_id)
        .await?)
}
