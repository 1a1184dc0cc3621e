//! Exam repository: generated papers and the questions printed on them.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::academics::{AcademicSession, Term};
use scholaris_core::exams::{
    Difficulty, ExamBlueprint, ExamError as GenerationError, QuestionKind, generate_exam,
};
use scholaris_shared::AppError;
use scholaris_shared::types::{PageRequest, PageResponse};

use super::question::{QuestionError, QuestionRepository};
use super::{database_error, domain_error};
use crate::entities::{exam_questions, exams, questions, sea_orm_active_enums};

/// Error types for exam operations.
#[derive(Debug, thiserror::Error)]
pub enum ExamError {
    /// Exam not found in this school.
    #[error("Exam not found: {0}")]
    NotFound(Uuid),

    /// Title is blank.
    #[error("Exam title is required")]
    MissingTitle,

    /// The paper could not be drawn from the bank.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Loading the bank failed.
    #[error(transparent)]
    Question(#[from] QuestionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ExamError> for AppError {
    fn from(err: ExamError) -> Self {
        match err {
            ExamError::NotFound(_) => Self::NotFound(err.to_string()),
            ExamError::MissingTitle => Self::Validation(err.to_string()),
            ExamError::Generation(e) => domain_error(e.http_status_code(), e.to_string()),
            ExamError::Question(e) => e.into(),
            ExamError::Database(e) => database_error(&e),
        }
    }
}

/// Request for a new paper.
#[derive(Debug, Clone)]
pub struct GenerateExamInput {
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
    pub easy: u32,
    /// Number of medium questions.
    pub medium: u32,
    /// Number of hard questions.
    pub hard: u32,
    /// Allowed formats; empty allows every format.
    pub kinds: Vec<QuestionKind>,
    /// Shuffle multiple choice options.
    pub shuffle_options: bool,
    /// Seed to reproduce a paper; a fresh one is drawn when absent.
    pub seed: Option<u64>,
}

/// A question as printed on a paper.
#[derive(Debug, Clone, Serialize)]
pub struct ExamQuestionDetail {
    /// 1-based position.
    pub position: i32,
    /// Bank question.
    pub question_id: Uuid,
    /// Format.
    pub kind: QuestionKind,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Question text.
    pub body: String,
    /// Options in printed order.
    pub options: Vec<String>,
    /// Marking answer.
    pub answer: Option<String>,
    /// Marks awarded.
    pub marks: i32,
}

/// An exam with its questions in order.
#[derive(Debug, Clone, Serialize)]
pub struct ExamWithQuestions {
    /// Exam header.
    #[serde(flatten)]
    pub exam: exams::Model,
    /// Questions by position.
    pub questions: Vec<ExamQuestionDetail>,
}

/// Exam repository.
#[derive(Debug, Clone)]
pub struct ExamRepository {
    db: Arc<DatabaseConnection>,
    bank: QuestionRepository,
}

impl ExamRepository {
    /// Creates a new exam repository.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        let bank = QuestionRepository::new(Arc::clone(&db));
        Self { db, bank }
    }

    /// Draws a paper from the school's bank and stores it.
    ///
    /// # Errors
    ///
    /// Returns `MissingTitle`, `Generation` when the blueprint is empty or
    /// the bank runs short, or a database error.
    pub async fn generate(
        &self,
        school_id: Uuid,
        input: GenerateExamInput,
    ) -> Result<ExamWithQuestions, ExamError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ExamError::MissingTitle);
        }
        let blueprint = ExamBlueprint {
            subject: input.subject.trim().to_string(),
            class_level: input.class_level.trim().to_string(),
            easy: input.easy,
            medium: input.medium,
            hard: input.hard,
            kinds: input.kinds,
            shuffle_options: input.shuffle_options,
            seed: input.seed.unwrap_or_else(fresh_seed),
        };
        if blueprint.question_count() == 0 {
            return Err(GenerationError::EmptyBlueprint.into());
        }

        let bank = self
            .bank
            .bank_for(school_id, &blueprint.subject, &blueprint.class_level)
            .await?;
        let paper = generate_exam(&bank, &blueprint).inspect_err(|e| {
            warn!(%school_id, subject = %blueprint.subject, error = %e, "Exam generation failed");
        })?;

        let exam_id = Uuid::now_v7();
        let txn = self.db.begin().await?;
        let exam = exams::ActiveModel {
            id: Set(exam_id),
            school_id: Set(school_id),
            title: Set(title),
            subject: Set(blueprint.subject.clone()),
            class_level: Set(blueprint.class_level.clone()),
            term: Set(input.term.map(Into::into)),
            session: Set(input.session.map(|s| s.to_string())),
            duration_minutes: Set(input.duration_minutes.and_then(|m| i32::try_from(m).ok())),
            seed: Set(seed_to_i64(blueprint.seed)),
            total_marks: Set(saturating_i32(paper.total_marks)),
            question_count: Set(saturating_i32(blueprint.question_count())),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        let rows: Vec<exam_questions::ActiveModel> = paper
            .items
            .iter()
            .map(|item| exam_questions::ActiveModel {
                id: Set(Uuid::now_v7()),
                school_id: Set(school_id),
                exam_id: Set(exam_id),
                question_id: Set(item.question_id.into_inner()),
                position: Set(saturating_i32(item.position)),
                options: Set(serde_json::json!(item.options)),
                marks: Set(saturating_i32(item.marks)),
            })
            .collect();
        exam_questions::Entity::insert_many(rows).exec(&txn).await?;
        txn.commit().await?;

        info!(
            %school_id,
            %exam_id,
            questions = paper.items.len(),
            total_marks = paper.total_marks,
            seed = blueprint.seed,
            "Exam generated"
        );

        let by_id: HashMap<Uuid, _> = bank.into_iter().map(|q| (q.id.into_inner(), q)).collect();
        let questions = paper
            .items
            .into_iter()
            .filter_map(|item| {
                let question = by_id.get(&item.question_id.into_inner())?;
                Some(ExamQuestionDetail {
                    position: saturating_i32(item.position),
                    question_id: item.question_id.into_inner(),
                    kind: question.kind,
                    difficulty: item.difficulty,
                    body: question.body.clone(),
                    options: item.options,
                    answer: question.answer.clone(),
                    marks: saturating_i32(item.marks),
                })
            })
            .collect();

        Ok(ExamWithQuestions { exam, questions })
    }

    /// Gets an exam with its questions in paper order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the exam does not belong to the school.
    pub async fn get(&self, school_id: Uuid, exam_id: Uuid) -> Result<ExamWithQuestions, ExamError> {
        let exam = exams::Entity::find_by_id(exam_id)
            .filter(exams::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(ExamError::NotFound(exam_id))?;

        let items = exam_questions::Entity::find()
            .filter(exam_questions::Column::ExamId.eq(exam_id))
            .order_by_asc(exam_questions::Column::Position)
            .all(self.db.as_ref())
            .await?;
        let ids: Vec<Uuid> = items.iter().map(|i| i.question_id).collect();
        let bank: HashMap<Uuid, questions::Model> = questions::Entity::find()
            .filter(questions::Column::SchoolId.eq(school_id))
            .filter(questions::Column::Id.is_in(ids))
            .all(self.db.as_ref())
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();

        let questions = items
            .into_iter()
            .filter_map(|item| {
                let question = bank.get(&item.question_id)?;
                Some(detail(item, question))
            })
            .collect();
        Ok(ExamWithQuestions { exam, questions })
    }

    /// Lists exams, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        school_id: Uuid,
        page: PageRequest,
    ) -> Result<PageResponse<exams::Model>, ExamError> {
        let query = exams::Entity::find().filter(exams::Column::SchoolId.eq(school_id));
        let total = query.clone().count(self.db.as_ref()).await?;
        let items = query
            .order_by_desc(exams::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.db.as_ref())
            .await?;
        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    /// Deletes an exam and its question list.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the exam does not belong to the school.
    pub async fn delete(&self, school_id: Uuid, exam_id: Uuid) -> Result<(), ExamError> {
        let deleted = exams::Entity::delete_many()
            .filter(exams::Column::SchoolId.eq(school_id))
            .filter(exams::Column::Id.eq(exam_id))
            .exec(self.db.as_ref())
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ExamError::NotFound(exam_id));
        }
        info!(%school_id, %exam_id, "Exam deleted");
        Ok(())
    }
}

fn detail(item: exam_questions::Model, question: &questions::Model) -> ExamQuestionDetail {
    ExamQuestionDetail {
        position: item.position,
        question_id: item.question_id,
        kind: question.kind.into(),
        difficulty: question.difficulty.into(),
        body: question.body.clone(),
        options: serde_json::from_value(item.options).unwrap_or_default(),
        answer: question.answer.clone(),
        marks: item.marks,
    }
}

fn fresh_seed() -> u64 {
    Uuid::new_v4().as_u64_pair().1
}

/// Stores the seed bit-for-bit in a signed column.
const fn seed_to_i64(seed: u64) -> i64 {
    i64::from_be_bytes(seed.to_be_bytes())
}

/// Reads a stored seed back.
#[must_use]
pub const fn seed_from_i64(stored: i64) -> u64 {
    u64::from_be_bytes(stored.to_be_bytes())
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
