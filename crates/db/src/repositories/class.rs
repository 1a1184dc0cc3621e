//! Class repository.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_shared::AppError;

use super::database_error;
use crate::entities::{classes, students, teachers};

/// Error types for class operations.
#[derive(Debug, thiserror::Error)]
pub enum ClassError {
    /// Class not found in this school.
    #[error("Class not found: {0}")]
    NotFound(Uuid),

    /// Class name already used in this school.
    #[error("Class '{0}' already exists")]
    DuplicateName(String),

    /// The class teacher is not a teacher of this school.
    #[error("Teacher not found: {0}")]
    TeacherNotFound(Uuid),

    /// Students are still enrolled.
    #[error("Cannot delete class: {0} students are enrolled")]
    HasStudents(u64),

    /// Capacity is not positive or below the current enrolment.
    #[error("Invalid capacity {capacity}: {enrolled} students are enrolled")]
    InvalidCapacity {
        /// Requested capacity.
        capacity: i32,
        /// Students currently in the class.
        enrolled: u64,
    },

    /// Required field missing.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ClassError> for AppError {
    fn from(err: ClassError) -> Self {
        match err {
            ClassError::NotFound(_) | ClassError::TeacherNotFound(_) => Self::NotFound(err.to_string()),
            ClassError::DuplicateName(_) => Self::Conflict(err.to_string()),
            ClassError::HasStudents(_) | ClassError::InvalidCapacity { .. } => {
                Self::BusinessRule(err.to_string())
            }
            ClassError::MissingField(_) => Self::Validation(err.to_string()),
            ClassError::Database(e) => database_error(&e),
        }
    }
}

/// Input for creating a class.
#[derive(Debug, Clone)]
pub struct CreateClassInput {
    /// Display name, unique per school (e.g. "JSS 1A").
    pub name: String,
    /// Class level questions and exams are keyed on (e.g. "JSS1").
    pub level: String,
    /// Class teacher.
    pub class_teacher_id: Option<Uuid>,
    /// Maximum number of students.
    pub capacity: Option<i32>,
}

/// Changes to a class. Nested options clear the field when `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct UpdateClassInput {
    /// New name.
    pub name: Option<String>,
    /// New level.
    pub level: Option<String>,
    /// New class teacher.
    pub class_teacher_id: Option<Option<Uuid>>,
    /// New capacity.
    pub capacity: Option<Option<i32>>,
}

/// Class repository.
#[derive(Debug, Clone)]
pub struct ClassRepository {
    db: Arc<DatabaseConnection>,
}

impl ClassRepository {
    /// Creates a new class repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a class.
    ///
    /// # Errors
    ///
    /// Returns `MissingField`, `InvalidCapacity`, `TeacherNotFound` or
    /// `DuplicateName`.
    pub async fn create(
        &self,
        school_id: Uuid,
        input: CreateClassInput,
    ) -> Result<classes::Model, ClassError> {
        let name = required("name", &input.name)?;
        let level = required("level", &input.level)?;
        if let Some(capacity) = input.capacity {
            check_capacity(capacity, 0)?;
        }
        if let Some(teacher_id) = input.class_teacher_id {
            self.ensure_teacher(school_id, teacher_id).await?;
        }
        if self.name_taken(school_id, &name, None).await? {
            return Err(ClassError::DuplicateName(name));
        }

        let now = Utc::now().into();
        let class = classes::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(school_id),
            name: Set(name),
            level: Set(level),
            class_teacher_id: Set(input.class_teacher_id),
            capacity: Set(input.capacity),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(%school_id, class_id = %class.id, name = %class.name, "Class created");
        Ok(class)
    }

    /// Lists the school's classes by level and name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, school_id: Uuid) -> Result<Vec<classes::Model>, ClassError> {
        Ok(classes::Entity::find()
            .filter(classes::Column::SchoolId.eq(school_id))
            .order_by_asc(classes::Column::Level)
            .order_by_asc(classes::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    /// Gets a class by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the class does not belong to the school.
    pub async fn get(&self, school_id: Uuid, class_id: Uuid) -> Result<classes::Model, ClassError> {
        classes::Entity::find_by_id(class_id)
            .filter(classes::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(ClassError::NotFound(class_id))
    }

    /// Updates a class.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `MissingField`, `TeacherNotFound`, `DuplicateName`
    /// or `InvalidCapacity` when the capacity would fall below enrolment.
    pub async fn update(
        &self,
        school_id: Uuid,
        class_id: Uuid,
        input: UpdateClassInput,
    ) -> Result<classes::Model, ClassError> {
        let class = self.get(school_id, class_id).await?;
        let mut model = class.into_active_model();

        if let Some(name) = input.name {
            let name = required("name", &name)?;
            if self.name_taken(school_id, &name, Some(class_id)).await? {
                return Err(ClassError::DuplicateName(name));
            }
            model.name = Set(name);
        }
        if let Some(level) = input.level {
            model.level = Set(required("level", &level)?);
        }
        if let Some(teacher) = input.class_teacher_id {
            if let Some(teacher_id) = teacher {
                self.ensure_teacher(school_id, teacher_id).await?;
            }
            model.class_teacher_id = Set(teacher);
        }
        if let Some(capacity) = input.capacity {
            if let Some(capacity) = capacity {
                let enrolled = self.count_students(class_id).await?;
                check_capacity(capacity, enrolled)?;
            }
            model.capacity = Set(capacity);
        }
        model.updated_at = Set(Utc::now().into());

        let class = model.update(self.db.as_ref()).await?;
        info!(%school_id, %class_id, "Class updated");
        Ok(class)
    }

    /// Deletes a class with no enrolled students.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `HasStudents`.
    pub async fn delete(&self, school_id: Uuid, class_id: Uuid) -> Result<(), ClassError> {
        let class = self.get(school_id, class_id).await?;
        let enrolled = self.count_students(class_id).await?;
        if enrolled > 0 {
            warn!(%school_id, %class_id, enrolled, "Class delete rejected");
            return Err(ClassError::HasStudents(enrolled));
        }

        classes::Entity::delete_many()
            .filter(classes::Column::SchoolId.eq(school_id))
            .filter(classes::Column::Id.eq(class.id))
            .exec(self.db.as_ref())
            .await?;
        info!(%school_id, %class_id, "Class deleted");
        Ok(())
    }

    async fn ensure_teacher(&self, school_id: Uuid, teacher_id: Uuid) -> Result<(), ClassError> {
        let count = teachers::Entity::find()
            .filter(teachers::Column::SchoolId.eq(school_id))
            .filter(teachers::Column::Id.eq(teacher_id))
            .count(self.db.as_ref())
            .await?;
        if count == 0 {
            return Err(ClassError::TeacherNotFound(teacher_id));
        }
        Ok(())
    }

    async fn name_taken(
        &self,
        school_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, ClassError> {
        let mut query = classes::Entity::find()
            .filter(classes::Column::SchoolId.eq(school_id))
            .filter(classes::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(classes::Column::Id.ne(id));
        }
        Ok(query.count(self.db.as_ref()).await? > 0)
    }

    async fn count_students(&self, class_id: Uuid) -> Result<u64, ClassError> {
        Ok(students::Entity::find()
            .filter(students::Column::ClassId.eq(class_id))
            .count(self.db.as_ref())
            .await?)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ClassError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClassError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn check_capacity(capacity: i32, enrolled: u64) -> Result<(), ClassError> {
    let fits = u64::try_from(capacity).is_ok_and(|cap| cap > 0 && cap >= enrolled);
    if fits {
        Ok(())
    } else {
        Err(ClassError::InvalidCapacity { capacity, enrolled })
    }
}
