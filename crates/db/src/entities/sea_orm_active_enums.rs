//! Postgres enum types and their mapping to domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use scholaris_core::{academics, exams, ledger, teachers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[sea_orm(string_value = "asset")]
    Asset,
    #[sea_orm(string_value = "liability")]
    Liability,
    #[sea_orm(string_value = "equity")]
    Equity,
    #[sea_orm(string_value = "revenue")]
    Revenue,
    #[sea_orm(string_value = "expense")]
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_source")]
#[serde(rename_all = "snake_case")]
pub enum JournalSource {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "fees")]
    Fees,
    #[sea_orm(string_value = "payroll")]
    Payroll,
    #[sea_orm(string_value = "expense")]
    Expense,
    #[sea_orm(string_value = "wallet")]
    Wallet,
    #[sea_orm(string_value = "reversal")]
    Reversal,
    #[sea_orm(string_value = "opening_balance")]
    OpeningBalance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "teacher_status")]
#[serde(rename_all = "snake_case")]
pub enum TeacherStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "on_leave")]
    OnLeave,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "gender")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "employment_type")]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[sea_orm(string_value = "full_time")]
    FullTime,
    #[sea_orm(string_value = "part_time")]
    PartTime,
    #[sea_orm(string_value = "contract")]
    Contract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "term")]
#[serde(rename_all = "snake_case")]
pub enum Term {
    #[sea_orm(string_value = "first")]
    First,
    #[sea_orm(string_value = "second")]
    Second,
    #[sea_orm(string_value = "third")]
    Third,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "question_kind")]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    #[sea_orm(string_value = "multiple_choice")]
    MultipleChoice,
    #[sea_orm(string_value = "true_false")]
    TrueFalse,
    #[sea_orm(string_value = "short_answer")]
    ShortAnswer,
    #[sea_orm(string_value = "essay")]
    Essay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "difficulty")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[sea_orm(string_value = "easy")]
    Easy,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "hard")]
    Hard,
}

/// Two-way conversion between a stored enum and its domain enum.
macro_rules! domain_enum {
    ($db:ident <=> $module:ident :: $domain:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$db> for $module::$domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant),+
                }
            }
        }

        impl From<$module::$domain> for $db {
            fn from(value: $module::$domain) -> Self {
                match value {
                    $($module::$domain::$variant => Self::$variant),+
                }
            }
        }
    };
}

domain_enum!(AccountType <=> ledger::AccountType { Asset, Liability, Equity, Revenue, Expense });
domain_enum!(JournalSource <=> ledger::JournalSource {
    Manual,
    Fees,
    Payroll,
    Expense,
    Wallet,
    Reversal,
    OpeningBalance,
});
domain_enum!(TeacherStatus <=> teachers::TeacherStatus { Draft, Active, OnLeave, Inactive });
domain_enum!(Gender <=> teachers::Gender { Male, Female });
domain_enum!(EmploymentType <=> teachers::EmploymentType { FullTime, PartTime, Contract });
domain_enum!(Term <=> academics::Term { First, Second, Third });
domain_enum!(QuestionKind <=> exams::QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
});
domain_enum!(Difficulty <=> exams::Difficulty { Easy, Medium, Hard });
