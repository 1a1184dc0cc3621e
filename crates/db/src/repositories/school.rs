//! School repository: the tenants themselves.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use tracing::info;
use uuid::Uuid;

use scholaris_shared::AppError;

use super::database_error;
use crate::entities::schools;

const DEFAULT_CURRENCY: &str = "NGN";

/// Error types for school operations.
#[derive(Debug, thiserror::Error)]
pub enum SchoolError {
    /// School not found.
    #[error("School not found: {0}")]
    NotFound(Uuid),

    /// Slug already taken.
    #[error("School slug '{0}' already exists")]
    DuplicateSlug(String),

    /// Input failed validation.
    #[error("Invalid school: {0}")]
    Invalid(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<SchoolError> for AppError {
    fn from(err: SchoolError) -> Self {
        match err {
            SchoolError::NotFound(_) => Self::NotFound(err.to_string()),
            SchoolError::DuplicateSlug(_) => Self::Conflict(err.to_string()),
            SchoolError::Invalid(_) => Self::Validation(err.to_string()),
            SchoolError::Database(e) => database_error(&e),
        }
    }
}

/// Input for creating a school.
#[derive(Debug, Clone)]
pub struct CreateSchoolInput {
    /// Display name.
    pub name: String,
    /// URL-safe unique slug.
    pub slug: String,
    /// ISO 4217 code; defaults to NGN.
    pub currency: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// School repository.
#[derive(Debug, Clone)]
pub struct SchoolRepository {
    db: Arc<DatabaseConnection>,
}

impl SchoolRepository {
    /// Creates a new school repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a school.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for a malformed slug or currency and `DuplicateSlug`
    /// when the slug is taken.
    pub async fn create(&self, input: CreateSchoolInput) -> Result<schools::Model, SchoolError> {
        let slug = input.slug.trim().to_lowercase();
        if !is_valid_slug(&slug) {
            return Err(SchoolError::Invalid(
                "slug may only contain lowercase letters, digits and '-'".into(),
            ));
        }
        let currency = input
            .currency
            .map_or_else(|| DEFAULT_CURRENCY.to_string(), |c| c.trim().to_uppercase());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(SchoolError::Invalid("currency must be a 3-letter code".into()));
        }
        if self.slug_exists(&slug).await? {
            return Err(SchoolError::DuplicateSlug(slug));
        }

        let now = Utc::now().into();
        let school = schools::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name.trim().to_string()),
            slug: Set(slug),
            currency: Set(currency),
            address: Set(input.address),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(school_id = %school.id, slug = %school.slug, "School created");
        Ok(school)
    }

    /// Finds a school by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<schools::Model>, SchoolError> {
        Ok(schools::Entity::find_by_id(id).one(self.db.as_ref()).await?)
    }

    /// Finds an active school, the check behind every tenant-scoped request.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown or inactive schools.
    pub async fn find_active(&self, id: Uuid) -> Result<schools::Model, SchoolError> {
        schools::Entity::find_by_id(id)
            .filter(schools::Column::IsActive.eq(true))
            .one(self.db.as_ref())
            .await?
            .ok_or(SchoolError::NotFound(id))
    }

    /// Finds a school by slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<schools::Model>, SchoolError> {
        Ok(schools::Entity::find()
            .filter(schools::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await?)
    }

    /// Lists active schools by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_active(&self) -> Result<Vec<schools::Model>, SchoolError> {
        Ok(schools::Entity::find()
            .filter(schools::Column::IsActive.eq(true))
            .order_by_asc(schools::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, SchoolError> {
        let count = schools::Entity::find()
            .filter(schools::Column::Slug.eq(slug))
            .count(self.db.as_ref())
            .await?;
        Ok(count > 0)
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= 100
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;

    #[test]
    fn test_slug_rules() {
        assert!(is_valid_slug("greenfield-academy"));
        assert!(is_valid_slug("school24"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("-lead"));
        assert!(!is_valid_slug("has space"));
        assert!(!is_valid_slug("under_score"));
    }

    #[tokio::test]
    async fn test_inactive_school_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<schools::Model>::new()])
            .into_connection();
        let repo = SchoolRepository::new(Arc::new(db));
        let id = Uuid::now_v7();
        assert!(matches!(
            repo.find_active(id).await,
            Err(SchoolError::NotFound(found)) if found == id
        ));
    }

    #[tokio::test]
    async fn test_bad_currency_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = SchoolRepository::new(Arc::new(db));
        let err = repo
            .create(CreateSchoolInput {
                name: "Greenfield Academy".into(),
                slug: "greenfield".into(),
                currency: Some("naira".into()),
                address: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SchoolError::Invalid(_)));
    }
}
