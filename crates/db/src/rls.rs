//! Row-Level Security (RLS) context management.
//!
//! Every tenant table carries a `tenant_isolation` policy keyed on the
//! `app.current_school_id` setting. Repositories already filter on
//! `school_id`; running writes through [`RlsConnection`] makes the database
//! enforce the same boundary.
//!
//! # Usage
//!
//! ```ignore
//! use scholaris_db::rls::RlsConnection;
//!
//! let rls = RlsConnection::new(&db, school_id).await?;
//! let teachers = teachers::Entity::find().all(rls.transaction()).await?;
//! rls.commit().await?;
//! ```

use sea_orm::{ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use uuid::Uuid;

/// A transaction with the school context set for row-level security.
pub struct RlsConnection {
    txn: DatabaseTransaction,
}

impl RlsConnection {
    /// Begins a transaction and sets `app.current_school_id` with `SET LOCAL`,
    /// so the setting ends with the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction cannot be started or the context
    /// cannot be set.
    pub async fn new(db: &DatabaseConnection, school_id: Uuid) -> Result<Self, DbErr> {
        let txn = db.begin().await?;
        set_rls_context(&txn, school_id).await?;
        Ok(Self { txn })
    }

    /// The underlying transaction.
    #[must_use]
    pub fn transaction(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Commits the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails.
    pub async fn commit(self) -> Result<(), DbErr> {
        self.txn.commit().await
    }

    /// Rolls back the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback fails.
    pub async fn rollback(self) -> Result<(), DbErr> {
        self.txn.rollback().await
    }
}

/// Extension trait for `DatabaseConnection` to open school-scoped transactions.
#[async_trait::async_trait]
pub trait RlsExt {
    /// Opens an RLS transaction for the given school.
    ///
    /// # Errors
    ///
    /// Returns an error if the RLS connection cannot be created.
    async fn with_rls(&self, school_id: Uuid) -> Result<RlsConnection, DbErr>;
}

#[async_trait::async_trait]
impl RlsExt for DatabaseConnection {
    async fn with_rls(&self, school_id: Uuid) -> Result<RlsConnection, DbErr> {
        RlsConnection::new(self, school_id).await
    }
}

/// Sets the RLS context on an existing transaction.
///
/// # Errors
///
/// Returns an error if the statement fails.
pub async fn set_rls_context(txn: &DatabaseTransaction, school_id: Uuid) -> Result<(), DbErr> {
    txn.execute_unprepared(&rls_statement(school_id)).await?;
    Ok(())
}

// A Uuid renders as hex and dashes only, so inlining it is safe.
fn rls_statement(school_id: Uuid) -> String {
    format!("SET LOCAL app.current_school_id = '{school_id}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rls_statement_format() {
        let school_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            rls_statement(school_id),
            "SET LOCAL app.current_school_id = '550e8400-e29b-41d4-a716-446655440000'"
        );
    }
}
