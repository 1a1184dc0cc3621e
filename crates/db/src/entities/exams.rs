//! `SeaORM` Entity for exams table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::Term;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "exams")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub school_id: Uuid,
    pub title: String,
    pub subject: String,
    pub class_level: String,
    pub term: Option<Term>,
    pub session: Option<String>,
    pub duration_minutes: Option<i32>,
    pub seed: i64,
    pub total_marks: i32,
    pub question_count: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::exam_questions::Entity")]
    ExamQuestions,
}

impl Related<super::exam_questions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExamQuestions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
