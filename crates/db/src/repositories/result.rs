//! Result repository: graded scores per student, subject, term and session.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::academics::{
    AcademicSession, ClassReport, GradingError, GradingScale, ResultRow, ScoreLimits, Scores, Term,
};
use scholaris_shared::types::StudentId;
use scholaris_shared::{AcademicsConfig, AppError};

use super::{database_error, domain_error};
use crate::entities::{classes, results, sea_orm_active_enums, students};

/// Error types for result operations.
#[derive(Debug, thiserror::Error)]
pub enum ResultError {
    /// Result not found in this school.
    #[error("Result not found: {0}")]
    NotFound(Uuid),

    /// Student not found in this school.
    #[error("Student not found: {0}")]
    StudentNotFound(Uuid),

    /// Class not found in this school.
    #[error("Class not found: {0}")]
    ClassNotFound(Uuid),

    /// The student is not in any class.
    #[error("Student {0} is not enrolled in a class")]
    NotEnrolled(Uuid),

    /// Scores, session or subject rejected.
    #[error(transparent)]
    Grading(#[from] GradingError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ResultError> for AppError {
    fn from(err: ResultError) -> Self {
        match err {
            ResultError::NotFound(_)
            | ResultError::StudentNotFound(_)
            | ResultError::ClassNotFound(_) => Self::NotFound(err.to_string()),
            ResultError::NotEnrolled(_) => Self::BusinessRule(err.to_string()),
            ResultError::Grading(e) => domain_error(e.http_status_code(), e.to_string()),
            ResultError::Database(e) => database_error(&e),
        }
    }
}

/// Scores for one student in one subject.
#[derive(Debug, Clone)]
pub struct UpsertResultInput {
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

/// Filter for listing results.
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    /// Only this class.
    pub class_id: Option<Uuid>,
    /// Only this student.
    pub student_id: Option<Uuid>,
    /// Only this subject.
    pub subject: Option<String>,
    /// Only this term.
    pub term: Option<Term>,
    /// Only this session.
    pub session: Option<AcademicSession>,
}

/// Class report with the term it covers.
#[derive(Debug, Clone, Serialize)]
pub struct ClassTermReport {
    /// Class.
    pub class_id: Uuid,
    /// Term.
    pub term: Term,
    /// Session.
    pub session: AcademicSession,
    /// Lowest passing total.
    pub pass_mark: Decimal,
    /// Statistics and positions.
    #[serde(flatten)]
    pub report: ClassReport,
}

/// Result repository.
#[derive(Debug, Clone)]
pub struct ResultRepository {
    db: Arc<DatabaseConnection>,
    limits: ScoreLimits,
    scale: GradingScale,
}

impl ResultRepository {
    /// Creates a result repository with the default 40/60 split and scale.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self::with_grading(db, ScoreLimits::default(), GradingScale::default())
    }

    /// Creates a result repository with explicit limits and scale.
    #[must_use]
    pub const fn with_grading(db: Arc<DatabaseConnection>, limits: ScoreLimits, scale: GradingScale) -> Self {
        Self { db, limits, scale }
    }

    /// Creates a result repository from configuration.
    #[must_use]
    pub fn from_config(db: Arc<DatabaseConnection>, config: &AcademicsConfig) -> Self {
        Self::with_grading(
            db,
            ScoreLimits::new(config.ca_weight_max, config.exam_weight_max),
            GradingScale::default(),
        )
    }

    /// Records or replaces a student's scores for a subject and term.
    ///
    /// The result is filed under the student's current class.
    ///
    /// # Errors
    ///
    /// Returns `Grading` for a blank subject or out-of-range score,
    /// `StudentNotFound` or `NotEnrolled`.
    pub async fn upsert(
        &self,
        school_id: Uuid,
        input: UpsertResultInput,
    ) -> Result<results::Model, ResultError> {
        let subject = input.subject.trim().to_string();
        if subject.is_empty() {
            return Err(GradingError::EmptySubject.into());
        }
        let scores = Scores::new(input.ca_score, input.exam_score, &self.limits).inspect_err(|e| {
            warn!(%school_id, student_id = %input.student_id, error = %e, "Scores rejected");
        })?;

        let student = students::Entity::find_by_id(input.student_id)
            .filter(students::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(ResultError::StudentNotFound(input.student_id))?;
        let class_id = student.class_id.ok_or(ResultError::NotEnrolled(student.id))?;

        let term: sea_orm_active_enums::Term = input.term.into();
        let session = input.session.to_string();
        let existing = results::Entity::find()
            .filter(results::Column::SchoolId.eq(school_id))
            .filter(results::Column::StudentId.eq(student.id))
            .filter(results::Column::Subject.eq(subject.as_str()))
            .filter(results::Column::Term.eq(term))
            .filter(results::Column::Session.eq(session.as_str()))
            .one(self.db.as_ref())
            .await?;

        let now = Utc::now().into();
        let result = if let Some(existing) = existing {
            let mut model = existing.into_active_model();
            model.class_id = Set(class_id);
            self.write_scores(&mut model, scores);
            model.updated_at = Set(now);
            model.update(self.db.as_ref()).await?
        } else {
            let mut model = results::ActiveModel {
                id: Set(Uuid::now_v7()),
                school_id: Set(school_id),
                student_id: Set(student.id),
                class_id: Set(class_id),
                subject: Set(subject),
                term: Set(term),
                session: Set(session),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            self.write_scores(&mut model, scores);
            model.insert(self.db.as_ref()).await?
        };

        info!(
            %school_id,
            result_id = %result.id,
            student_id = %result.student_id,
            grade = %result.grade,
            "Result recorded"
        );
        Ok(result)
    }

    /// Lists results by subject, then student.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        school_id: Uuid,
        filter: ResultFilter,
    ) -> Result<Vec<results::Model>, ResultError> {
        let mut query = results::Entity::find().filter(results::Column::SchoolId.eq(school_id));
        if let Some(class_id) = filter.class_id {
            query = query.filter(results::Column::ClassId.eq(class_id));
        }
        if let Some(student_id) = filter.student_id {
            query = query.filter(results::Column::StudentId.eq(student_id));
        }
        if let Some(subject) = filter.subject {
            query = query.filter(results::Column::Subject.eq(subject.trim()));
        }
        if let Some(term) = filter.term {
            query = query.filter(results::Column::Term.eq(sea_orm_active_enums::Term::from(term)));
        }
        if let Some(session) = filter.session {
            query = query.filter(results::Column::Session.eq(session.to_string()));
        }

        Ok(query
            .order_by_asc(results::Column::Subject)
            .order_by_asc(results::Column::StudentId)
            .all(self.db.as_ref())
            .await?)
    }

    /// Gets a result by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the result does not belong to the school.
    pub async fn get(&self, school_id: Uuid, result_id: Uuid) -> Result<results::Model, ResultError> {
        results::Entity::find_by_id(result_id)
            .filter(results::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(ResultError::NotFound(result_id))
    }

    /// Replaces the scores of a result and regrades it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `Grading` for an out-of-range score.
    pub async fn update_scores(
        &self,
        school_id: Uuid,
        result_id: Uuid,
        ca_score: Decimal,
        exam_score: Decimal,
    ) -> Result<results::Model, ResultError> {
        let scores = Scores::new(ca_score, exam_score, &self.limits)?;
        let result = self.get(school_id, result_id).await?;

        let mut model = result.into_active_model();
        self.write_scores(&mut model, scores);
        model.updated_at = Set(Utc::now().into());
        let result = model.update(self.db.as_ref()).await?;

        info!(%school_id, %result_id, grade = %result.grade, "Result scores updated");
        Ok(result)
    }

    /// Deletes a result.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the result does not belong to the school.
    pub async fn delete(&self, school_id: Uuid, result_id: Uuid) -> Result<(), ResultError> {
        let deleted = results::Entity::delete_many()
            .filter(results::Column::SchoolId.eq(school_id))
            .filter(results::Column::Id.eq(result_id))
            .exec(self.db.as_ref())
            .await?;
        if deleted.rows_affected == 0 {
            return Err(ResultError::NotFound(result_id));
        }
        info!(%school_id, %result_id, "Result deleted");
        Ok(())
    }

    /// Builds the subject statistics and student positions of a class for
    /// one term.
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` if the class does not belong to the school.
    pub async fn class_report(
        &self,
        school_id: Uuid,
        class_id: Uuid,
        term: Term,
        session: AcademicSession,
    ) -> Result<ClassTermReport, ResultError> {
        classes::Entity::find_by_id(class_id)
            .filter(classes::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(ResultError::ClassNotFound(class_id))?;

        let rows: Vec<ResultRow> = self
            .list(
                school_id,
                ResultFilter {
                    class_id: Some(class_id),
                    term: Some(term),
                    session: Some(session.clone()),
                    ..ResultFilter::default()
                },
            )
            .await?
            .into_iter()
            .map(|r| ResultRow {
                student_id: StudentId::from_uuid(r.student_id),
                subject: r.subject,
                total: r.total,
            })
            .collect();

        let pass_mark = self.scale.pass_mark();
        Ok(ClassTermReport {
            class_id,
            term,
            session,
            pass_mark,
            report: ClassReport::build(&rows, pass_mark),
        })
    }

    fn write_scores(&self, model: &mut results::ActiveModel, scores: Scores) {
        let total = scores.total();
        let band = self.scale.band_for(total);
        model.ca_score = Set(scores.ca);
        model.exam_score = Set(scores.exam);
        model.total = Set(total);
        model.grade = Set(band.grade.clone());
        model.remark = Set(band.remark.clone());
    }
}
