//! Student results and class reports.

use axum::{
    Router,
    extract::State,
    routing::get,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use scholaris_core::academics::{AcademicSession, Term};
use scholaris_db::ResultRepository;
use scholaris_db::repositories::{ResultFilter, UpsertResultInput};

use crate::AppState;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Tenant};
use crate::response::{ApiResult, deleted, ok};

/// Creates the result routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school_id}/results", get(list_results).put(record_result))
        .route(
            "/schools/{school_id}/results/{result_id}",
            get(get_result).patch(update_scores).delete(delete_result),
        )
        .route("/schools/{school_id}/classes/{class_id}/report", get(class_report))
}

fn repository(state: &AppState) -> ResultRepository {
    ResultRepository::from_config(state.conn(), &state.academics)
}

/// Query parameters for listing results.
#[derive(Debug, Deserialize)]
pub struct ListResultsQuery {
    /// Only this class.
    pub class_id: Option<Uuid>,
    /// Only this student.
    pub student_id: Option<Uuid>,
    /// Only this subject.
    pub subject: Option<String>,
    /// Only this term.
    pub term: Option<Term>,
    /// Only this session, e.g. `2024/2025`.
    pub session: Option<AcademicSession>,
}

/// Request body for recording a result.
#[derive(Debug, Deserialize)]
pub struct RecordResultRequest {
    /// Student.
    pub student_id: Uuid,
    /// Subject name.
    pub subject: String,
    /// Term.
    pub term: Term,
    /// Academic session.
    pub session: AcademicSession,
    /// Continuous assessment score.
    pub ca_score: Decimal,
    /// Exam score.
    pub exam_score: Decimal,
}

/// Request body for correcting scores.
#[derive(Debug, Deserialize)]
pub struct UpdateScoresRequest {
    /// Continuous assessment score.
    pub ca_score: Decimal,
    /// Exam score.
    pub exam_score: Decimal,
}

/// `?term=first&session=2024/2025`.
#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// Term.
    pub term: Term,
    /// Session.
    pub session: AcademicSession,
}

/// GET `/schools/{school_id}/results`.
async fn list_results(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<ListResultsQuery>,
) -> ApiResult {
    let filter = ResultFilter {
        class_id: query.class_id,
        student_id: query.student_id,
        subject: query.subject,
        term: query.term,
        session: query.session,
    };
    ok(repository(&state).list(tenant.id(), filter).await?)
}

/// PUT `/schools/{school_id}/results` - Records or replaces the result for
/// a student, subject, term and session.
async fn record_result(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<RecordResultRequest>,
) -> ApiResult {
    let input = UpsertResultInput {
        student_id: payload.student_id,
        subject: payload.subject,
        term: payload.term,
        session: payload.session,
        ca_score: payload.ca_score,
        exam_score: payload.exam_score,
    };
    ok(repository(&state).upsert(tenant.id(), input).await?)
}

/// GET `/schools/{school_id}/results/{result_id}`.
async fn get_result(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, result_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(repository(&state).get(tenant.id(), result_id).await?)
}

/// PATCH `/schools/{school_id}/results/{result_id}`.
async fn update_scores(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, result_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(payload): ApiJson<UpdateScoresRequest>,
) -> ApiResult {
    ok(repository(&state)
        .update_scores(tenant.id(), result_id, payload.ca_score, payload.exam_score)
        .await?)
}

/// DELETE `/schools/{school_id}/results/{result_id}`.
async fn delete_result(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, result_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    repository(&state).delete(tenant.id(), result_id).await?;
    deleted()
}

/// GET `/schools/{school_id}/classes/{class_id}/report?term=&session=`.
async fn class_report(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, class_id)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult {
    ok(repository(&state)
        .class_report(tenant.id(), class_id, query.term, query.session)
        .await?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use scholaris_db::entities::{classes, results, sea_orm_active_enums};

    use super::*;
    use crate::routes::test_support::{send, tenant_mock};

    fn result(school_id: Uuid, class_id: Uuid, student_id: Uuid, total: Decimal) -> results::Model {
        let now = Utc::now().into();
        results::Model {
            id: Uuid::now_v7(),
            school_id,
            student_id,
            class_id,
            subject: "Mathematics".into(),
            term: sea_orm_active_enums::Term::First,
            session: "2024/2025".into(),
            ca_score: dec!(30),
            exam_score: total - dec!(30),
            total,
            grade: "B".into(),
            remark: "Very good".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_rejected() {
        let school_id = Uuid::now_v7();
        let (status, body) = send(
            tenant_mock(school_id).into_connection(),
            "PUT",
            &format!("/api/v1/schools/{school_id}/results"),
            Some(json!({
                "student_id": Uuid::now_v7(),
                "subject": "Mathematics",
                "term": "first",
                "session": "2024/2025",
                "ca_score": "45",
                "exam_score": "50"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_bad_session_is_rejected() {
        let school_id = Uuid::now_v7();
        let (status, _) = send(
            tenant_mock(school_id).into_connection(),
            "GET",
            &format!(
                "/api/v1/schools/{school_id}/classes/{}/report?term=first&session=2024-2025",
                Uuid::now_v7()
            ),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_class_report_ranks_students() {
        let school_id = Uuid::now_v7();
        let now = Utc::now().into();
        let class = classes::Model {
            id: Uuid::now_v7(),
            school_id,
            name: "SS 1A".into(),
            level: "SS1".into(),
            class_teacher_id: None,
            capacity: None,
            created_at: now,
            updated_at: now,
        };
        let class_id = class.id;
        let (first, second) = (Uuid::now_v7(), Uuid::now_v7());
        let db = tenant_mock(school_id)
            .append_query_results([vec![class]])
            .append_query_results([vec![
                result(school_id, class_id, first, dec!(62)),
                result(school_id, class_id, second, dec!(81)),
            ]])
            .into_connection();

        let (status, body) = send(
            db,
            "GET",
            &format!(
                "/api/v1/schools/{school_id}/classes/{class_id}/report?term=first&session=2024/2025"
            ),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session"], "2024/2025");
        let students = body["data"]["students"].as_array().unwrap();
        assert_eq!(students.len(), 2);
        assert_eq!(students[0]["student_id"], second.to_string());
        assert_eq!(students[0]["position"], 1);
        assert_eq!(students[1]["position"], 2);
    }
}
