//! Question bank repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::exams::{Difficulty, ExamError, Question, QuestionKind};
use scholaris_shared::AppError;
use scholaris_shared::types::{PageRequest, PageResponse, QuestionId};

use super::{database_error, domain_error};
use crate::entities::{exam_questions, questions, sea_orm_active_enums};

/// Error types for question bank operations.
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    /// Question not found in this school.
    #[error("Question not found: {0}")]
    NotFound(Uuid),

    /// Question failed validation.
    #[error(transparent)]
    Invalid(#[from] ExamError),

    /// Question appears on a generated exam.
    #[error("Question {0} is used by an exam and cannot be deleted")]
    InUse(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<QuestionError> for AppError {
    fn from(err: QuestionError) -> Self {
        match err {
            QuestionError::NotFound(_) => Self::NotFound(err.to_string()),
            QuestionError::Invalid(e) => domain_error(e.http_status_code(), e.to_string()),
            QuestionError::InUse(_) => Self::Conflict(err.to_string()),
            QuestionError::Database(e) => database_error(&e),
        }
    }
}

/// Question fields as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    /// Subject.
    pub subject: String,
    /// Class level.
    pub class_level: String,
    /// Topic within the subject.
    #[serde(default)]
    pub topic: Option<String>,
    /// Format.
    pub kind: QuestionKind,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Question text.
    pub body: String,
    /// Options for multiple choice.
    #[serde(default)]
    pub options: Vec<String>,
    /// Correct answer or marking guide.
    #[serde(default)]
    pub answer: Option<String>,
    /// Marks awarded.
    pub marks: u32,
}

/// Filter for listing the bank.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    /// Only this subject.
    pub subject: Option<String>,
    /// Only this class level.
    pub class_level: Option<String>,
    /// Only this difficulty.
    pub difficulty: Option<Difficulty>,
    /// Only this format.
    pub kind: Option<QuestionKind>,
}

/// Question bank repository.
#[derive(Debug, Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Creates a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Adds a question to the bank.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if the question fails validation for its kind.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: QuestionInput,
    ) -> Result<questions::Model, QuestionError> {
        let question = checked(QuestionId::new(), input)?;
        let marks = stored_marks(question.marks)?;

        let now = Utc::now().into();
        let model = questions::ActiveModel {
            id: Set(question.id.into_inner()),
            school_id: Set(school_id),
            subject: Set(question.subject),
            class_level: Set(question.class_level),
            topic: Set(question.topic),
            kind: Set(question.kind.into()),
            difficulty: Set(question.difficulty.into()),
            body: Set(question.body),
            options: Set(serde_json::json!(question.options)),
            answer: Set(question.answer),
            marks: Set(marks),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(%school_id, question_id = %model.id, subject = %model.subject, "Question added");
        Ok(model)
    }

    /// Lists the bank, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: QuestionFilter,
        page: PageRequest,
    ) -> Result<PageResponse<questions::Model>, QuestionError> {
        let mut query = questions::Entity::find().filter(questions::Column::SchoolId.eq(school_id));
        if let Some(subject) = filter.subject {
            query = query.filter(questions::Column::Subject.eq(subject.trim()));
        }
        if let Some(level) = filter.class_level {
            query = query.filter(questions::Column::ClassLevel.eq(level.trim()));
        }
        if let Some(difficulty) = filter.difficulty {
            query = query.filter(
                questions::Column::Difficulty.eq(sea_orm_active_enums::Difficulty::from(difficulty)),
            );
        }
        if let Some(kind) = filter.kind {
            query = query.filter(questions::Column::Kind.eq(sea_orm_active_enums::QuestionKind::from(kind)));
        }

        let total = query.clone().count(self.db.as_ref()).await?;
        let items = query
            .order_by_desc(questions::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await?;

        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    /// Gets a question by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the question does not belong to the school.
    pub async fn get(&self, school_id: Uuid, question_id: Uuid) -> Result<questions::Model, QuestionError> {
        questions::Entity::find_by_id(question_id)
            .filter(questions::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(QuestionError::NotFound(question_id))
    }

    /// Replaces a question. Papers already generated keep the options they
    /// were printed with.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Invalid`.
    pub async fn update(
        &self,
        school_id: Uuid,
        question_id: Uuid,
        input: QuestionInput,
    ) -> Result<questions::Model, QuestionError> {
        let question = checked(QuestionId::from_uuid(question_id), input)?;
        let marks = stored_marks(question.marks)?;
        let existing = self.get(school_id, question_id).await?;

        let mut model = existing.into_active_model();
        model.subject = Set(question.subject);
        model.class_level = Set(question.class_level);
        model.topic = Set(question.topic);
        model.kind = Set(question.kind.into());
        model.difficulty = Set(question.difficulty.into());
        model.body = Set(question.body);
        model.options = Set(serde_json::json!(question.options));
        model.answer = Set(question.answer);
        model.marks = Set(marks);
        model.updated_at = Set(Utc::now().into());
        let model = model.update(self.db.as_ref()).await?;

        info!(%school_id, %question_id, "Question updated");
        Ok(model)
    }

    /// Deletes a question no exam uses.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `InUse`.
    pub async fn delete(&self, school_id: Uuid, question_id: Uuid) -> Result<(), QuestionError> {
        let question = self.get(school_id, question_id).await?;
        let uses = exam_questions::Entity::find()
            .filter(exam_questions::Column::QuestionId.eq(question.id))
            .count(self.db.as_ref())
            .await?;
        if uses > 0 {
            warn!(%school_id, %question_id, uses, "Question delete rejected");
            return Err(QuestionError::InUse(question_id));
        }

        questions::Entity::delete_by_id(question.id).exec(self.db.as_ref()).await?;
        info!(%school_id, %question_id, "Question deleted");
        Ok(())
    }

    /// Loads every question of a subject and level, ignoring case. This is
    /// the pool an exam is drawn from.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn bank_for(
        &self,
        school_id: Uuid,
        subject: &str,
        class_level: &str,
    ) -> Result<Vec<Question>, QuestionError> {
        let rows = questions::Entity::find()
            .filter(questions::Column::SchoolId.eq(school_id))
            .filter(
                Expr::expr(Func::lower(Expr::col(questions::Column::Subject)))
                    .eq(subject.trim().to_lowercase()),
            )
            .filter(
                Expr::expr(Func::lower(Expr::col(questions::Column::ClassLevel)))
                    .eq(class_level.trim().to_lowercase()),
            )
            .all(self.db.as_ref())
            .await?;
        Ok(rows.into_iter().map(to_question).collect())
    }
}

/// Trims the input and validates it as a question.
fn checked(id: QuestionId, input: QuestionInput) -> Result<Question, ExamError> {
    let question = Question {
        id,
        subject: input.subject.trim().to_string(),
        class_level: input.class_level.trim().to_string(),
        topic: input
            .topic
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        kind: input.kind,
        difficulty: input.difficulty,
        body: input.body.trim().to_string(),
        options: input.options.iter().map(|o| o.trim().to_string()).collect(),
        answer: input
            .answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty()),
        marks: input.marks,
    };
    question.validate()?;
    Ok(question)
}

fn stored_marks(marks: u32) -> Result<i32, ExamError> {
    i32::try_from(marks).map_err(|_| ExamError::InvalidQuestion {
        field: "marks",
        message: "is too large".to_string(),
    })
}

/// Converts a stored row to the domain question.
pub(crate) fn to_question(model: questions::Model) -> Question {
    Question {
        id: QuestionId::from_uuid(model.id),
        subject: model.subject,
        class_level: model.class_level,
        topic: model.topic,
        kind: model.kind.into(),
        difficulty: model.difficulty.into(),
        body: model.body,
        options: serde_json::from_value(model.options).unwrap_or_default(),
        answer: model.answer,
        marks: u32::try_from(model.marks).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    fn multiple_choice() -> QuestionInput {
        QuestionInput {
            subject: " Mathematics ".into(),
            class_level: "JSS1".into(),
            topic: Some("  ".into()),
            kind: QuestionKind::MultipleChoice,
            difficulty: Difficulty::Easy,
            body: "What is 7 x 8?".into(),
            options: vec!["54".into(), " 56".into(), "58".into()],
            answer: Some("56".into()),
            marks: 2,
        }
    }

    #[test]
    fn test_checked_trims_before_validating() {
        let question = checked(QuestionId::new(), multiple_choice()).unwrap();
        assert_eq!(question.subject, "Mathematics");
        assert_eq!(question.topic, None);
        assert_eq!(question.options[1], "56");
    }

    #[test]
    fn test_answer_outside_options_rejected() {
        let mut input = multiple_choice();
        input.answer = Some("57".into());
        assert!(matches!(
            checked(QuestionId::new(), input),
            Err(ExamError::InvalidQuestion { field: "answer", .. })
        ));
    }

    #[test]
    fn test_to_question_reads_options() {
        let now = Utc::now().into();
        let model = questions::Model {
            id: Uuid::now_v7(),
            school_id: Uuid::now_v7(),
            subject: "Basic Science".into(),
            class_level: "JSS2".into(),
            topic: None,
            kind: sea_orm_active_enums::QuestionKind::MultipleChoice,
            difficulty: sea_orm_active_enums::Difficulty::Medium,
            body: "Which gas do plants absorb?".into(),
            options: serde_json::json!(["Oxygen", "Carbon dioxide"]),
            answer: Some("Carbon dioxide".into()),
            marks: 3,
            created_at: now,
            updated_at: now,
        };
        let question = to_question(model);
        assert_eq!(question.options.len(), 2);
        assert_eq!(question.marks, 3);
        assert!(question.validate().is_ok());
    }

    #[tokio::test]
    async fn test_question_of_other_school_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<questions::Model>::new()])
            .into_connection();
        let repo = QuestionRepository::new(Arc::new(db));
        let id = Uuid::now_v7();

        let err = repo.delete(Uuid::now_v7(), id).await.unwrap_err();
        assert!(matches!(err, QuestionError::NotFound(found) if found == id));
    }
}
