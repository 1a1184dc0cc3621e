//! `SeaORM` entity definitions.

pub mod prelude;

pub mod account_balances;
pub mod chart_of_accounts;
pub mod classes;
pub mod exam_questions;
pub mod exams;
pub mod fiscal_years;
pub mod journal_entries;
pub mod ledger_entries;
pub mod questions;
pub mod results;
pub mod schools;
pub mod sea_orm_active_enums;
pub mod students;
pub mod teachers;
