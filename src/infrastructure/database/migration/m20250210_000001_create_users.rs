//! Create the user tables
//!
//! These tables belong to the user subsystem; the file graph only reads
//! them. They are created here so the share foreign keys and the
//! authorization join have something to reference in a fresh database.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Handle)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserAncestorsUserDescendants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserAncestorsUserDescendants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(UserAncestorsUserDescendants::AncestorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserAncestorsUserDescendants::DescendantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserAncestorsUserDescendants::DescendantDepth)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_uaud_ancestor_id")
                            .from(
                                UserAncestorsUserDescendants::Table,
                                UserAncestorsUserDescendants::AncestorId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_uaud_descendant_id")
                            .from(
                                UserAncestorsUserDescendants::Table,
                                UserAncestorsUserDescendants::DescendantId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uaud_ancestor_id_descendant_id_uidx")
                    .table(UserAncestorsUserDescendants::Table)
                    .col(UserAncestorsUserDescendants::AncestorId)
                    .col(UserAncestorsUserDescendants::DescendantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Authorization resolves ancestors of a given user.
        manager
            .create_index(
                Index::create()
                    .name("uaud_descendant_id_idx")
                    .table(UserAncestorsUserDescendants::Table)
                    .col(UserAncestorsUserDescendants::DescendantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(UserAncestorsUserDescendants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Handle,
}

#[derive(DeriveIden)]
enum UserAncestorsUserDescendants {
    Table,
    Id,
    AncestorId,
    DescendantId,
    DescendantDepth,
}
