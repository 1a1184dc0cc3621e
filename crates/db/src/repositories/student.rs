//! Student repository.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::teachers::Gender;
use scholaris_shared::AppError;

use super::database_error;
use crate::entities::{classes, students};

/// Error types for student operations.
#[derive(Debug, thiserror::Error)]
pub enum StudentError {
    /// Student not found in this school.
    #[error("Student not found: {0}")]
    NotFound(Uuid),

    /// Class not found in this school.
    #[error("Class not found: {0}")]
    ClassNotFound(Uuid),

    /// Admission number already used in this school.
    #[error("Admission number '{0}' already exists")]
    DuplicateAdmissionNumber(String),

    /// The class has no free places.
    #[error("Class is full ({0} students)")]
    ClassFull(i32),

    /// Required field missing.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StudentError> for AppError {
    fn from(err: StudentError) -> Self {
        match err {
            StudentError::NotFound(_) | StudentError::ClassNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            StudentError::DuplicateAdmissionNumber(_) => Self::Conflict(err.to_string()),
            StudentError::ClassFull(_) => Self::BusinessRule(err.to_string()),
            StudentError::MissingField(_) => Self::Validation(err.to_string()),
            StudentError::Database(e) => database_error(&e),
        }
    }
}

/// Input for enrolling a student.
#[derive(Debug, Clone)]
pub struct CreateStudentInput {
    /// Class to enrol into.
    pub class_id: Option<Uuid>,
    /// School-issued number, unique per school.
    pub admission_number: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Gender.
    pub gender: Gender,
    /// Date of birth.
    pub date_of_birth: Option<NaiveDate>,
}

/// Student repository.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    db: Arc<DatabaseConnection>,
}

impl StudentRepository {
    /// Creates a new student repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Enrols a student, optionally into a class.
    ///
    /// # Errors
    ///
    /// Returns `MissingField`, `ClassNotFound`, `ClassFull` or
    /// `DuplicateAdmissionNumber`.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: CreateStudentInput,
    ) -> Result<students::Model, StudentError> {
        let admission_number = required("admission_number", &input.admission_number)?;
        let first_name = required("first_name", &input.first_name)?;
        let last_name = required("last_name", &input.last_name)?;

        if let Some(class_id) = input.class_id {
            let class = self.find_class(school_id, class_id).await?;
            if let Some(capacity) = class.capacity {
                let enrolled = self.count_in_class(class_id).await?;
                if enrolled >= u64::try_from(capacity).unwrap_or(0) {
                    warn!(%school_id, %class_id, capacity, "Class full");
                    return Err(StudentError::ClassFull(capacity));
                }
            }
        }

        let taken = students::Entity::find()
            .filter(students::Column::SchoolId.eq(school_id))
            .filter(students::Column::AdmissionNumber.eq(admission_number.as_str()))
            .count(self.db.as_ref())
            .await?;
        if taken > 0 {
            return Err(StudentError::DuplicateAdmissionNumber(admission_number));
        }

        let now = Utc::now().into();
        let student = students::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            class_id: Set(input.class_id),
            admission_number: Set(admission_number),
            first_name: Set(first_name),
            last_name: Set(last_name),
            gender: Set(input.gender.into()),
            date_of_birth: Set(input.date_of_birth),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(%school_id, student_id = %student.id, "Student enrolled");
        Ok(student)
    }

    /// Gets a student by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the student does not belong to the school.
    pub async fn get(&self, school_id: Uuid, student_id: Uuid) -> Result<students::Model, StudentError> {
        students::Entity::find_by_id(student_id)
            .filter(students::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(StudentError::NotFound(student_id))
    }

    /// Lists the students of a class by name.
    ///
    /// # Errors
    ///
    /// Returns `ClassNotFound` if the class does not belong to the school.
    pub async fn list_by_class(
        &self,
        school_id: Uuid,
        class_id: Uuid,
    ) -> Result<Vec<students::Model>, StudentError> {
        self.find_class(school_id, class_id).await?;
        Ok(students::Entity::find()
            .filter(students::Column::SchoolId.eq(school_id))
            .filter(students::Column::ClassId.eq(class_id))
            .order_by_asc(students::Column::LastName)
            .order_by_asc(students::Column::FirstName)
            .all(self.db.as_ref())
            .await?)
    }

    async fn find_class(&self, school_id: Uuid, class_id: Uuid) -> Result<classes::Model, StudentError> {
        classes::Entity::find_by_id(class_id)
            .filter(classes::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(StudentError::ClassNotFound(class_id))
    }

    async fn count_in_class(&self, class_id: Uuid) -> Result<u64, StudentError> {
        Ok(students::Entity::find()
            .filter(students::Column::ClassId.eq(class_id))
            .count(self.db.as_ref())
            .await?)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, StudentError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StudentError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    use super::*;

    fn input(class_id: Option<Uuid>) -> CreateStudentInput {
        CreateStudentInput {
            class_id,
            admission_number: "GFA/2025/014".into(),
            first_name: "Tunde".into(),
            last_name: "Bakare".into(),
            gender: Gender::Male,
            date_of_birth: NaiveDate::from_ymd_opt(2013, 9, 1),
        }
    }

    #[tokio::test]
    async fn test_full_class_rejects_enrolment() {
        let school_id = Uuid::now_v7();
        let now = Utc::now().into();
        let class = classes::Model {
            id: Uuid::now_v7(),
            school_id,
            name: "JSS 1A".into(),
            level: "JSS1".into(),
            class_teacher_id: None,
            capacity: Some(2),
            created_at: now,
            updated_at: now,
        };
        let class_id = class.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![class]])
            .append_query_results([vec![BTreeMap::from([(
                "num_items".to_string(),
                Value::BigInt(Some(2)),
            )])]])
            .into_connection();
        let repo = StudentRepository::new(Arc::new(db));

        let err = repo.create(school_id, input(Some(class_id))).await.unwrap_err();
        assert!(matches!(err, StudentError::ClassFull(2)));
    }

    #[tokio::test]
    async fn test_class_of_other_school_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<classes::Model>::new()])
            .into_connection();
        let repo = StudentRepository::new(Arc::new(db));
        let class_id = Uuid::now_v7();

        let err = repo.list_by_class(Uuid::now_v7(), class_id).await.unwrap_err();
        assert!(matches!(err, StudentError::ClassNotFound(id) if id == class_id));
    }

    #[tokio::test]
    async fn test_blank_admission_number_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = StudentRepository::new(Arc::new(db));
        let mut student = input(None);
        student.admission_number = " ".into();

        let err = repo.create(Uuid::now_v7(), student).await.unwrap_err();
        assert!(matches!(err, StudentError::MissingField("admission_number")));
    }
}
