//! Account repository for chart of accounts database operations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use scholaris_core::ledger::{AccountType, NormalBalance};
use scholaris_core::posting::SystemAccount;
use scholaris_shared::AppError;
use scholaris_shared::types::Amount;

use super::database_error;
use crate::entities::{account_balances, chart_of_accounts, ledger_entries, sea_orm_active_enums};

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account code already exists in the school.
    #[error("Account code '{0}' already exists")]
    DuplicateCode(String),

    /// Account not found in this school.
    #[error("Account not found: {0}")]
    NotFound(Uuid),

    /// Code or name is blank.
    #[error("Account {0} is required")]
    MissingField(&'static str),

    /// Cannot change account type because account has ledger entries.
    #[error("Cannot change account type: account has {0} ledger entries")]
    HasLedgerEntries(u64),

    /// Cannot delete account because it has ledger entries.
    #[error("Cannot delete account: account has {0} ledger entries")]
    CannotDeleteWithEntries(u64),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::DuplicateCode(_) => Self::Conflict(err.to_string()),
            AccountError::NotFound(_) => Self::NotFound(err.to_string()),
            AccountError::MissingField(_) => Self::Validation(err.to_string()),
            AccountError::HasLedgerEntries(_) | AccountError::CannotDeleteWithEntries(_) => {
                Self::BusinessRule(err.to_string())
            }
            AccountError::Database(e) => database_error(&e),
        }
    }
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// School ID.
    pub school_id: Uuid,
    /// Account code, unique within the school.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account description.
    pub description: Option<String>,
    /// Account classification.
    pub account_type: AccountType,
    /// Seeded standard account.
    pub is_system: bool,
}

/// Input for updating an account.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// Account code.
    pub code: Option<String>,
    /// Account name.
    pub name: Option<String>,
    /// Account description.
    pub description: Option<Option<String>>,
    /// Account type (only if no ledger entries).
    pub account_type: Option<AccountType>,
    /// Whether the account is active.
    pub is_active: Option<bool>,
}

/// Filter options for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    /// Filter by account type.
    pub account_type: Option<AccountType>,
    /// Filter by active status.
    pub is_active: Option<bool>,
}

/// Account with its latest balance.
#[derive(Debug, Clone, Serialize)]
pub struct AccountWithBalance {
    /// The account record.
    #[serde(flatten)]
    pub account: chart_of_accounts::Model,
    /// Latest running balance in minor units.
    pub balance: Amount,
}

/// Balance of one account on a date.
#[derive(Debug, Clone, Serialize)]
pub struct AccountBalanceAsOf {
    /// Account ID.
    pub account_id: Uuid,
    /// Date the balance is taken at (inclusive).
    pub as_of: NaiveDate,
    /// Signed balance in the account's normal direction.
    pub balance: Amount,
}

/// One account line of a trial balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: Uuid,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Debit column.
    pub debit: Amount,
    /// Credit column.
    pub credit: Amount,
}

/// Trial balance at a date.
#[derive(Debug, Clone, Serialize)]
pub struct TrialBalance {
    /// Date (inclusive).
    pub as_of: NaiveDate,
    /// Accounts with a non-zero balance, by code.
    pub rows: Vec<TrialBalanceRow>,
    /// Sum of the debit column.
    pub total_debit: Amount,
    /// Sum of the credit column.
    pub total_credit: Amount,
}

/// Account repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: Arc<DatabaseConnection>,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Creates a new account.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken in this school.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<chart_of_accounts::Model, AccountError> {
        let code = input.code.trim().to_string();
        let name = input.name.trim().to_string();
        if code.is_empty() {
            return Err(AccountError::MissingField("code"));
        }
        if name.is_empty() {
            return Err(AccountError::MissingField("name"));
        }
        if self.code_exists(input.school_id, &code, None).await? {
            return Err(AccountError::DuplicateCode(code));
        }

        let now = Utc::now().into();
        let account = chart_of_accounts::ActiveModel {
            id: Set(Uuid::now_v7()),
            school_id: Set(input.school_id),
            code: Set(code),
            name: Set(name),
            description: Set(input.description),
            account_type: Set(input.account_type.into()),
            is_active: Set(true),
            is_system: Set(input.is_system),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(school_id = %account.school_id, account_id = %account.id, code = %account.code, "Account created");
        Ok(account)
    }

    /// Lists accounts ordered by code, with their latest balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(
        &self,
        school_id: Uuid,
        filter: AccountFilter,
    ) -> Result<Vec<AccountWithBalance>, AccountError> {
        let mut query = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .order_by_asc(chart_of_accounts::Column::Code);

        if let Some(account_type) = filter.account_type {
            query = query.filter(
                chart_of_accounts::Column::AccountType
                    .eq(sea_orm_active_enums::AccountType::from(account_type)),
            );
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(chart_of_accounts::Column::IsActive.eq(is_active));
        }

        let accounts = query.all(self.db.as_ref()).await?;
        let balances = self.balances_as_of(school_id, None).await?;

        Ok(accounts
            .into_iter()
            .map(|account| {
                let balance = balances.get(&account.id).copied().unwrap_or_default();
                AccountWithBalance { account, balance }
            })
            .collect())
    }

    /// Gets an account with its latest balance.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not belong to the school.
    pub async fn get_account(
        &self,
        school_id: Uuid,
        account_id: Uuid,
    ) -> Result<AccountWithBalance, AccountError> {
        let account = self.find(school_id, account_id).await?;
        let balance = self.latest_balance(school_id, account_id, None).await?;
        Ok(AccountWithBalance { account, balance })
    }

    /// Finds the school's accounts with the given codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_codes(
        &self,
        school_id: Uuid,
        codes: &[&str],
    ) -> Result<Vec<chart_of_accounts::Model>, AccountError> {
        let accounts = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .filter(chart_of_accounts::Column::Code.is_in(codes.iter().copied()))
            .all(self.db.as_ref())
            .await?;
        Ok(accounts)
    }

    /// Creates the standard accounts the posting rules rely on, skipping
    /// codes the school already uses. Returns the accounts created.
    ///
    /// # Errors
    ///
    /// Returns an error if a query or insert fails.
    pub async fn seed_system_accounts(
        &self,
        school_id: Uuid,
    ) -> Result<Vec<chart_of_accounts::Model>, AccountError> {
        let codes: Vec<&str> = SystemAccount::ALL.iter().map(|role| role.code()).collect();
        let existing: HashSet<String> = self
            .find_by_codes(school_id, &codes)
            .await?
            .into_iter()
            .map(|account| account.code)
            .collect();

        let mut created = Vec::new();
        for role in SystemAccount::ALL {
            if existing.contains(role.code()) {
                continue;
            }
            let account = self
                .create_account(CreateAccountInput {
                    school_id,
                    code: role.code().to_string(),
                    name: role.name().to_string(),
                    description: None,
                    account_type: role.account_type(),
                    is_system: true,
                })
                .await?;
            created.push(account);
        }

        info!(%school_id, created = created.len(), "Standard chart of accounts seeded");
        Ok(created)
    }

    /// Updates an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `DuplicateCode`, or `HasLedgerEntries` when the
    /// type changes on an account that already has lines.
    pub async fn update_account(
        &self,
        school_id: Uuid,
        account_id: Uuid,
        input: UpdateAccountInput,
    ) -> Result<chart_of_accounts::Model, AccountError> {
        let account = self.find(school_id, account_id).await?;

        if let Some(new_type) = input.account_type
            && sea_orm_active_enums::AccountType::from(new_type) != account.account_type
        {
            let entry_count = self.count_ledger_entries(school_id, account_id).await?;
            if entry_count > 0 {
                return Err(AccountError::HasLedgerEntries(entry_count));
            }
        }

        let new_code = input.code.map(|c| c.trim().to_string());
        if let Some(code) = &new_code {
            if code.is_empty() {
                return Err(AccountError::MissingField("code"));
            }
            if *code != account.code && self.code_exists(school_id, code, Some(account_id)).await? {
                return Err(AccountError::DuplicateCode(code.clone()));
            }
        }

        let mut active: chart_of_accounts::ActiveModel = account.into();
        if let Some(code) = new_code {
            active.code = Set(code);
        }
        if let Some(name) = input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AccountError::MissingField("name"));
            }
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(account_type) = input.account_type {
            active.account_type = Set(account_type.into());
        }
        if let Some(is_active) = input.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(self.db.as_ref()).await?;
        info!(%school_id, %account_id, "Account updated");
        Ok(updated)
    }

    /// Deactivates an account; it stays in reports but takes no new lines.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not belong to the school.
    pub async fn deactivate_account(
        &self,
        school_id: Uuid,
        account_id: Uuid,
    ) -> Result<chart_of_accounts::Model, AccountError> {
        self.update_account(
            school_id,
            account_id,
            UpdateAccountInput {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
    }

    /// Deletes an account that has never been used.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` or `CannotDeleteWithEntries`.
    pub async fn delete_account(&self, school_id: Uuid, account_id: Uuid) -> Result<(), AccountError> {
        let account = self.find(school_id, account_id).await?;

        let entry_count = self.count_ledger_entries(school_id, account.id).await?;
        if entry_count > 0 {
            return Err(AccountError::CannotDeleteWithEntries(entry_count));
        }

        chart_of_accounts::Entity::delete_many()
            .filter(chart_of_accounts::Column::Id.eq(account.id))
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .exec(self.db.as_ref())
            .await?;

        info!(%school_id, %account_id, "Account deleted");
        Ok(())
    }

    /// Balance of an account at the end of `as_of`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the account does not belong to the school.
    pub async fn balance_as_of(
        &self,
        school_id: Uuid,
        account_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<AccountBalanceAsOf, AccountError> {
        let account = self.find(school_id, account_id).await?;
        let balance = self.latest_balance(school_id, account.id, Some(as_of)).await?;
        Ok(AccountBalanceAsOf {
            account_id,
            as_of,
            balance,
        })
    }

    /// Trial balance at the end of `as_of`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance(
        &self,
        school_id: Uuid,
        as_of: NaiveDate,
    ) -> Result<TrialBalance, AccountError> {
        let accounts = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .order_by_asc(chart_of_accounts::Column::Code)
            .all(self.db.as_ref())
            .await?;
        let balances = self.balances_as_of(school_id, Some(as_of)).await?;

        let rows: Vec<TrialBalanceRow> = accounts
            .into_iter()
            .filter_map(|account| {
                let balance = balances.get(&account.id).copied().unwrap_or_default();
                if balance.is_zero() {
                    return None;
                }
                let account_type = AccountType::from(account.account_type);
                let (debit, credit) = trial_balance_columns(account_type, balance);
                Some(TrialBalanceRow {
                    account_id: account.id,
                    code: account.code,
                    name: account.name,
                    account_type,
                    debit,
                    credit,
                })
            })
            .collect();

        Ok(TrialBalance {
            as_of,
            total_debit: rows.iter().map(|r| r.debit).sum(),
            total_credit: rows.iter().map(|r| r.credit).sum(),
            rows,
        })
    }

    async fn find(
        &self,
        school_id: Uuid,
        account_id: Uuid,
    ) -> Result<chart_of_accounts::Model, AccountError> {
        chart_of_accounts::Entity::find_by_id(account_id)
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .one(self.db.as_ref())
            .await?
            .ok_or(AccountError::NotFound(account_id))
    }

    async fn code_exists(
        &self,
        school_id: Uuid,
        code: &str,
        except: Option<Uuid>,
    ) -> Result<bool, AccountError> {
        let mut query = chart_of_accounts::Entity::find()
            .filter(chart_of_accounts::Column::SchoolId.eq(school_id))
            .filter(chart_of_accounts::Column::Code.eq(code));
        if let Some(id) = except {
            query = query.filter(chart_of_accounts::Column::Id.ne(id));
        }
        Ok(query.count(self.db.as_ref()).await? > 0)
    }

    async fn count_ledger_entries(&self, school_id: Uuid, account_id: Uuid) -> Result<u64, AccountError> {
        let count = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::SchoolId.eq(school_id))
            .filter(ledger_entries::Column::AccountId.eq(account_id))
            .count(self.db.as_ref())
            .await?;
        Ok(count)
    }

    async fn latest_balance(
        &self,
        school_id: Uuid,
        account_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<Amount, AccountError> {
        let mut query = account_balances::Entity::find()
            .filter(account_balances::Column::SchoolId.eq(school_id))
            .filter(account_balances::Column::AccountId.eq(account_id));
        if let Some(date) = as_of {
            query = query.filter(account_balances::Column::BalanceDate.lte(date));
        }
        let latest = query
            .order_by_desc(account_balances::Column::BalanceDate)
            .one(self.db.as_ref())
            .await?;
        Ok(latest.map_or(Amount::ZERO, |row| Amount::new(row.balance)))
    }

    /// Latest balance per account, optionally as of a date.
    async fn balances_as_of(
        &self,
        school_id: Uuid,
        as_of: Option<NaiveDate>,
    ) -> Result<HashMap<Uuid, Amount>, AccountError> {
        let mut query = account_balances::Entity::find()
            .filter(account_balances::Column::SchoolId.eq(school_id));
        if let Some(date) = as_of {
            query = query.filter(account_balances::Column::BalanceDate.lte(date));
        }
        let rows = query
            .order_by_asc(account_balances::Column::AccountId)
            .order_by_desc(account_balances::Column::BalanceDate)
            .all(self.db.as_ref())
            .await?;

        let mut latest = HashMap::new();
        for row in rows {
            latest
                .entry(row.account_id)
                .or_insert_with(|| Amount::new(row.balance));
        }
        Ok(latest)
    }
}

/// Places a signed running balance in the debit or credit column.
///
/// A positive balance sits on the account's normal side; a negative one
/// (an overdrawn bank account, say) moves to the other side.
#[must_use]
pub fn trial_balance_columns(account_type: AccountType, balance: Amount) -> (Amount, Amount) {
    let magnitude = Amount::new(balance.minor().saturating_abs());
    let on_normal_side = !balance.is_negative();
    match (account_type.normal_balance(), on_normal_side) {
        (NormalBalance::Debit, true) | (NormalBalance::Credit, false) => (magnitude, Amount::ZERO),
        (NormalBalance::Debit, false) | (NormalBalance::Credit, true) => (Amount::ZERO, magnitude),
    }
}
