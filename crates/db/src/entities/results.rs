//! `SeaORM` Entity for results table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::Term;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "results")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub school_id: Uuid,
    pub student_id: Uuid,
    pub class_id: Uuid,
    pub subject: String,
    pub term: Term,
    pub session: String,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub ca_score: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub exam_score: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    pub total: Decimal,
    pub grade: String,
    pub remark: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::students::Entity",
        from = "Column::StudentId",
        to = "super::students::Column::Id"
    )]
    Students,
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Students.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
