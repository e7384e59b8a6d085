//! File closure entity
//!
//! One row per ancestor-descendant pair, including a depth-0 self edge for
//! every file. `descendant_path` is the `/`-joined run of names from the
//! ancestor down to the descendant, or `.` for the self edge;
//! `descendant_depth` is the hop count.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "file_ancestors_file_descendants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ancestor_id: Uuid,
    pub descendant_id: Uuid,
    pub descendant_path: String,
    pub descendant_depth: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::file::Entity",
        from = "Column::AncestorId",
        to = "super::file::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Ancestor,
    #[sea_orm(
        belongs_to = "super::file::Entity",
        from = "Column::DescendantId",
        to = "super::file::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Descendant,
}

impl ActiveModelBehavior for ActiveModel {}
