//! Fiscal year repository for database operations.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use scholaris_core::fiscal::{FiscalRuleError, ranges_overlap, validate_date_range};
use scholaris_shared::AppError;

use super::{database_error, domain_error};
use crate::entities::{fiscal_years, journal_entries};

/// Error types for fiscal operations.
#[derive(Debug, thiserror::Error)]
pub enum FiscalError {
    /// Date range or overlap rule violated.
    #[error(transparent)]
    Rule(#[from] FiscalRuleError),

    /// Fiscal year not found.
    #[error("Fiscal year not found: {0}")]
    YearNotFound(Uuid),

    /// Name already used in this school.
    #[error("Fiscal year '{0}' already exists")]
    DuplicateName(String),

    /// Another year starts in the same calendar year, which would clash
    /// with its entry numbers.
    #[error("A fiscal year starting in {0} already exists")]
    StartYearTaken(i32),

    /// Year is already closed.
    #[error("Fiscal year is already closed")]
    AlreadyClosed,

    /// Year still has unposted entries.
    #[error("Cannot close fiscal year: {0} draft journal entries remain")]
    DraftEntriesRemain(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<FiscalError> for AppError {
    fn from(err: FiscalError) -> Self {
        match err {
            FiscalError::Rule(e) => domain_error(e.http_status_code(), e.to_string()),
            FiscalError::YearNotFound(_) => Self::NotFound(err.to_string()),
            FiscalError::DuplicateName(_) | FiscalError::StartYearTaken(_) => {
                Self::Conflict(err.to_string())
            }
            FiscalError::AlreadyClosed | FiscalError::DraftEntriesRemain(_) => {
                Self::BusinessRule(err.to_string())
            }
            FiscalError::Database(e) => database_error(&e),
        }
    }
}

/// Input for creating a fiscal year.
#[derive(Debug, Clone)]
pub struct CreateFiscalYearInput {
    /// School ID.
    pub school_id: Uuid,
    /// Name, e.g. "2024/2025".
    pub name: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Make this the current year.
    pub is_current: bool,
}

/// Fiscal year repository.
#[derive(Debug, Clone)]
pub struct FiscalRepository {
    db: Arc<DatabaseConnection>,
}

impl FiscalRepository {
    /// Creates a new fiscal repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a fiscal year.
    ///
    /// When `is_current` is set, the flag is cleared on every other year of
    /// the school in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is invalid, overlaps another year, or the
    /// name or start year is taken.
    pub async fn create_fiscal_year(
        &self,
        input: CreateFiscalYearInput,
    ) -> Result<fiscal_years::Model, FiscalError> {
        validate_date_range(input.start_date, input.end_date)?;

        let existing = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::SchoolId.eq(input.school_id))
            .all(self.db.as_ref())
            .await?;

        let name = input.name.trim().to_string();
        for year in &existing {
            if ranges_overlap(
                (year.start_date, year.end_date),
                (input.start_date, input.end_date),
            ) {
                return Err(FiscalRuleError::Overlap(year.name.clone()).into());
            }
            if year.name == name {
                return Err(FiscalError::DuplicateName(name));
            }
            if year.start_date.year() == input.start_date.year() {
                return Err(FiscalError::StartYearTaken(input.start_date.year()));
            }
        }

        let txn = self.db.begin().await?;
        if input.is_current {
            clear_current(&txn, input.school_id).await?;
        }

        let now = Utc::now().into();
        let year = fiscal_years::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(input.school_id),
            name: Set(name),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_current: Set(input.is_current),
            is_closed: Set(false),
            closed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        info!(school_id = %year.school_id, fiscal_year_id = %year.id, name = %year.name, "Fiscal year created");
        Ok(year)
    }

    /// Lists the school's fiscal years, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_fiscal_years(
        &self,
        school_id: Uuid,
    ) -> Result<Vec<fiscal_years::Model>, FiscalError> {
        let years = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::SchoolId.eq(school_id))
            .order_by_desc(fiscal_years::Column::StartDate)
            .all(self.db.as_ref())
            .await?;
        Ok(years)
    }

    /// Gets a fiscal year.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound` if the year does not belong to the school.
    pub async fn get_fiscal_year(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<fiscal_years::Model, FiscalError> {
        fiscal_years::Entity::find_by_id(id)
            .filter(fiscal_years::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(FiscalError::YearNotFound(id))
    }

    /// The school's current fiscal year, if one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_current(
        &self,
        school_id: Uuid,
    ) -> Result<Option<fiscal_years::Model>, FiscalError> {
        let year = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::SchoolId.eq(school_id))
            .filter(fiscal_years::Column::IsCurrent.eq(true))
            .one(self.db.as_ref())
            .await?;
        Ok(year)
    }

    /// The fiscal year containing `date`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_for_date(
        &self,
        school_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<fiscal_years::Model>, FiscalError> {
        let year = fiscal_years::Entity::find()
            .filter(fiscal_years::Column::SchoolId.eq(school_id))
            .filter(fiscal_years::Column::StartDate.lte(date))
            .filter(fiscal_years::Column::EndDate.gte(date))
            .one(self.db.as_ref())
            .await?;
        Ok(year)
    }

    /// Makes a year the school's only current year.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound`, or `YearClosed` for a closed year.
    pub async fn set_current(
        &self,
        school_id: Uuid,
        id: Uuid,
    ) -> Result<fiscal_years::Model, FiscalError> {
        let year = self.get_fiscal_year(school_id, id).await?;
        if year.is_closed {
            return Err(FiscalRuleError::YearClosed.into());
        }

        let txn = self.db.begin().await?;
        clear_current(&txn, school_id).await?;

        let mut active: fiscal_years::ActiveModel = year.into();
        active.is_current = Set(true);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(%school_id, fiscal_year_id = %id, "Current fiscal year changed");
        Ok(updated)
    }

    /// Closes a year for posting.
    ///
    /// # Errors
    ///
    /// Returns `YearNotFound`, `AlreadyClosed`, or `DraftEntriesRemain` while
    /// unposted entries are dated in the year.
    pub async fn close(&self, school_id: Uuid, id: Uuid) -> Result<fiscal_years::Model, FiscalError> {
        let year = self.get_fiscal_year(school_id, id).await?;
        if year.is_closed {
            return Err(FiscalError::AlreadyClosed);
        }

        let drafts = journal_entries::Entity::find()
            .filter(journal_entries::Column::SchoolId.eq(school_id))
            .filter(journal_entries::Column::FiscalYearId.eq(id))
            .filter(journal_entries::Column::IsPosted.eq(false))
            .count(self.db.as_ref())
            .await?;
        if drafts > 0 {
            warn!(%school_id, fiscal_year_id = %id, drafts, "Fiscal year close rejected");
            return Err(FiscalError::DraftEntriesRemain(drafts));
        }

        let now = Utc::now().into();
        let mut active: fiscal_years::ActiveModel = year.into();
        active.is_closed = Set(true);
        active.closed_at = Set(Some(now));
        active.updated_at = Set(now);
        let updated = active.update(self.db.as_ref()).await?;

        info!(%school_id, fiscal_year_id = %id, "Fiscal year closed");
        Ok(updated)
    }
}

async fn clear_current(txn: &sea_orm::DatabaseTransaction, school_id: Uuid) -> Result<(), DbErr> {
    fiscal_years::Entity::update_many()
        .col_expr(fiscal_years::Column::IsCurrent, Expr::value(false))
        .filter(fiscal_years::Column::SchoolId.eq(school_id))
        .filter(fiscal_years::Column::IsCurrent.eq(true))
        .exec(txn)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::repositories::transaction_log;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn year(school_id: Uuid, name: &str, start: NaiveDate, end: NaiveDate) -> fiscal_years::Model {
        let now = Utc::now().into();
        fiscal_years::Model {
            id: Uuid::now_v7(),
            school_id,
            name: name.into(),
            start_date: start,
            end_date: end,
            is_current: true,
            is_closed: false,
            closed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_invalid_range_rejected_without_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let db = Arc::new(db);
        let repo = FiscalRepository::new(Arc::clone(&db));
        let err = repo
            .create_fiscal_year(CreateFiscalYearInput {
                school_id: Uuid::now_v7(),
                name: "2025/2026".into(),
                start_date: d(2026, 8, 31),
                end_date: d(2025, 9, 1),
                is_current: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FiscalError::Rule(FiscalRuleError::InvalidDateRange { .. })
        ));
        drop(repo);
        assert!(transaction_log(db).is_empty());
    }

    #[tokio::test]
    async fn test_overlap_rejected() {
        let school_id = Uuid::now_v7();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![year(school_id, "2024/2025", d(2024, 9, 1), d(2025, 8, 31))]])
            .into_connection();
        let repo = FiscalRepository::new(Arc::new(db));
        let err = repo
            .create_fiscal_year(CreateFiscalYearInput {
                school_id,
                name: "2025".into(),
                start_date: d(2025, 1, 1),
                end_date: d(2025, 12, 31),
                is_current: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FiscalError::Rule(FiscalRuleError::Overlap(ref name)) if name == "2024/2025"
        ));
    }

    #[tokio::test]
    async fn test_same_start_year_rejected() {
        let school_id = Uuid::now_v7();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![year(school_id, "H1 2025", d(2025, 1, 1), d(2025, 6, 30))]])
            .into_connection();
        let repo = FiscalRepository::new(Arc::new(db));
        let err = repo
            .create_fiscal_year(CreateFiscalYearInput {
                school_id,
                name: "H2 2025".into(),
                start_date: d(2025, 7, 1),
                end_date: d(2025, 12, 31),
                is_current: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, FiscalError::StartYearTaken(2025)));
    }

    #[tokio::test]
    async fn test_closed_year_cannot_become_current() {
        let school_id = Uuid::now_v7();
        let mut closed = year(school_id, "2023/2024", d(2023, 9, 1), d(2024, 8, 31));
        closed.is_closed = true;
        closed.is_current = false;
        let id = closed.id;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![closed]])
            .into_connection();
        let repo = FiscalRepository::new(Arc::new(db));
        assert!(matches!(
            repo.set_current(school_id, id).await,
            Err(FiscalError::Rule(FiscalRuleError::YearClosed))
        ));
    }
}
