//! File entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "files")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// `regular` or `directory`, constrained by the `file_types` lookup table
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::file_share::Entity")]
    FileShare,
}

impl Related<super::file_share::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileShare.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
