//! Question bank and generated exam papers.

use axum::{
    Router,
    extract::State,
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use scholaris_core::academics::{AcademicSession, Term};
use scholaris_core::exams::{Difficulty, QuestionKind};
use scholaris_db::repositories::{GenerateExamInput, QuestionFilter, QuestionInput};
use scholaris_db::{ExamRepository, QuestionRepository};

use super::page_request;
use crate::AppState;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Tenant};
use crate::response::{ApiResult, created, deleted, ok};

/// Creates the question bank and exam routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/schools/{school_id}/questions", get(list_questions).post(create_question))
        .route(
            "/schools/{school_id}/questions/{question_id}",
            get(get_question).put(update_question).delete(delete_question),
        )
        .route("/schools/{school_id}/exams", get(list_exams).post(generate_exam))
        .route(
            "/schools/{school_id}/exams/{exam_id}",
            get(get_exam).delete(delete_exam),
        )
}

/// Query parameters for browsing the bank.
#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    /// Only this subject.
    pub subject: Option<String>,
    /// Only this class level.
    pub class_level: Option<String>,
    /// Only this difficulty.
    pub difficulty: Option<Difficulty>,
    /// Only this format.
    pub kind: Option<QuestionKind>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (max 100).
    pub per_page: Option<u32>,
}

/// `?page=&per_page=`.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (max 100).
    pub per_page: Option<u32>,
}

/// Request body for generating a paper.
#[derive(Debug, Deserialize)]
pub struct GenerateExamRequest {
    /// Paper title.
    pub title: String,
    /// Subject to draw from.
    pub subject: String,
    /// Class level to draw from.
    pub class_level: String,
    /// Term the paper is for.
    pub term: Option<Term>,
    /// Session the paper is for.
    pub session: Option<AcademicSession>,
    /// Sitting time.
    pub duration_minutes: Option<u32>,
    /// Number of easy questions.
    #[serde(default)]
    pub easy: u32,
    /// Number of medium questions.
    #[serde(default)]
    pub medium: u32,
    /// Number of hard questions.
    #[serde(default)]
    pub hard: u32,
    /// Allowed formats; empty allows all.
    #[serde(default)]
    pub kinds: Vec<QuestionKind>,
    /// Shuffle multiple choice options.
    #[serde(default)]
    pub shuffle_options: bool,
    /// Seed of an earlier paper to reproduce it.
    pub seed: Option<u64>,
}

impl From<GenerateExamRequest> for GenerateExamInput {
    fn from(req: GenerateExamRequest) -> Self {
        Self {
            title: req.title,
            subject: req.subject,
            class_level: req.class_level,
            term: req.term,
            session: req.session,
            duration_minutes: req.duration_minutes,
            easy: req.easy,
            medium: req.medium,
            hard: req.hard,
            kinds: req.kinds,
            shuffle_options: req.shuffle_options,
            seed: req.seed,
        }
    }
}

/// GET `/schools/{school_id}/questions`.
async fn list_questions(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<ListQuestionsQuery>,
) -> ApiResult {
    let filter = QuestionFilter {
        subject: query.subject,
        class_level: query.class_level,
        difficulty: query.difficulty,
        kind: query.kind,
    };
    let page = page_request(query.page, query.per_page);
    ok(QuestionRepository::new(state.conn())
        .list(tenant.id(), filter, page)
        .await?)
}

/// POST `/schools/{school_id}/questions`.
async fn create_question(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(input): ApiJson<QuestionInput>,
) -> ApiResult {
    created(QuestionRepository::new(state.conn())
        .create(tenant.id(), input)
        .await?)
}

/// GET `/schools/{school_id}/questions/{question_id}`.
async fn get_question(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, question_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(QuestionRepository::new(state.conn())
        .get(tenant.id(), question_id)
        .await?)
}

/// PUT `/schools/{school_id}/questions/{question_id}`.
async fn update_question(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, question_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(input): ApiJson<QuestionInput>,
) -> ApiResult {
    ok(QuestionRepository::new(state.conn())
        .update(tenant.id(), question_id, input)
        .await?)
}

/// DELETE `/schools/{school_id}/questions/{question_id}` - Refused while
/// an exam uses the question.
async fn delete_question(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, question_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    QuestionRepository::new(state.conn())
        .delete(tenant.id(), question_id)
        .await?;
    deleted()
}

/// GET `/schools/{school_id}/exams`.
async fn list_exams(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> ApiResult {
    ok(ExamRepository::new(state.conn())
        .list(tenant.id(), page_request(query.page, query.per_page))
        .await?)
}

/// POST `/schools/{school_id}/exams` - Draws a paper from the bank.
async fn generate_exam(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiJson(payload): ApiJson<GenerateExamRequest>,
) -> ApiResult {
    created(ExamRepository::new(state.conn())
        .generate(tenant.id(), payload.into())
        .await?)
}

/// GET `/schools/{school_id}/exams/{exam_id}`.
async fn get_exam(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, exam_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ok(ExamRepository::new(state.conn())
        .get(tenant.id(), exam_id)
        .await?)
}

/// DELETE `/schools/{school_id}/exams/{exam_id}`.
async fn delete_exam(
    State(state): State<AppState>,
    tenant: Tenant,
    ApiPath((_, exam_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult {
    ExamRepository::new(state.conn())
        .delete(tenant.id(), exam_id)
        .await?;
    deleted()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use scholaris_db::entities::questions;

    use super::*;
    use crate::routes::test_support::{send, tenant_mock};

    #[tokio::test]
    async fn test_multiple_choice_needs_options() {
        let school_id = Uuid::now_v7();
        let (status, body) = send(
            tenant_mock(school_id).into_connection(),
            "POST",
            &format!("/api/v1/schools/{school_id}/questions"),
            Some(json!({
                "subject": "Biology",
                "class_level": "SS1",
                "kind": "multiple_choice",
                "difficulty": "easy",
                "body": "Which organelle makes ATP?",
                "options": ["Mitochondria"],
                "answer": "Mitochondria",
                "marks": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_empty_blueprint_is_rejected() {
        let school_id = Uuid::now_v7();
        let (status, _) = send(
            tenant_mock(school_id).into_connection(),
            "POST",
            &format!("/api/v1/schools/{school_id}/exams"),
            Some(json!({ "title": "Quiz", "subject": "Biology", "class_level": "SS1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_short_bank_is_unprocessable() {
        let school_id = Uuid::now_v7();
        let db = tenant_mock(school_id)
            .append_query_results([Vec::<questions::Model>::new()])
            .into_connection();

        let (status, body) = send(
            db,
            "POST",
            &format!("/api/v1/schools/{school_id}/exams"),
            Some(json!({
                "title": "First Term Biology",
                "subject": "Biology",
                "class_level": "SS1",
                "easy": 5
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("Not enough"));
    }
}
