//! Create the file tables and the file closure
//!
//! The closure is the full transitive one: every ancestor-descendant pair
//! has a row carrying the joined path and the hop depth, plus a depth-0
//! self edge per file. Name uniqueness within a directory is the partial
//! unique index over the depth-1 subset.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Lookup table constraining file types
        manager
            .create_table(
                Table::create()
                    .table(FileTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileTypes::Type)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        for file_type in ["regular", "directory"] {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(FileTypes::Table)
                        .columns([FileTypes::Type])
                        .values_panic([file_type.into()])
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Files::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Files::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Files::Type).string().not_null())
                    .col(
                        ColumnDef::new(Files::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_files_type")
                            .from(Files::Table, Files::Type)
                            .to(FileTypes::Table, FileTypes::Type),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FileAncestorsFileDescendants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileAncestorsFileDescendants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FileAncestorsFileDescendants::AncestorId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FileAncestorsFileDescendants::DescendantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FileAncestorsFileDescendants::DescendantPath)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FileAncestorsFileDescendants::DescendantDepth)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fafd_ancestor_id")
                            .from(
                                FileAncestorsFileDescendants::Table,
                                FileAncestorsFileDescendants::AncestorId,
                            )
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fafd_descendant_id")
                            .from(
                                FileAncestorsFileDescendants::Table,
                                FileAncestorsFileDescendants::DescendantId,
                            )
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Path resolution is keyed on (ancestor, path); in a tree the pair
        // is unique across all depths.
        manager
            .create_index(
                Index::create()
                    .name("fafd_ancestor_id_descendant_path_uidx")
                    .table(FileAncestorsFileDescendants::Table)
                    .col(FileAncestorsFileDescendants::AncestorId)
                    .col(FileAncestorsFileDescendants::DescendantPath)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // The depth-1 subset is the (parent, child name) relation; the
        // partial unique index is what concurrent add and move contend on.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX fafd_parent_id_child_name_uidx \
                 ON file_ancestors_file_descendants (ancestor_id, descendant_path) \
                 WHERE descendant_depth = 1",
            )
            .await?;

        // Parent lookups walk from the descendant side.
        manager
            .create_index(
                Index::create()
                    .name("fafd_descendant_id_descendant_depth_idx")
                    .table(FileAncestorsFileDescendants::Table)
                    .col(FileAncestorsFileDescendants::DescendantId)
                    .col(FileAncestorsFileDescendants::DescendantDepth)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(FileAncestorsFileDescendants::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Files::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FileTypes::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum FileTypes {
    Table,
    Type,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
    Type,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FileAncestorsFileDescendants {
    Table,
    Id,
    AncestorId,
    DescendantId,
    DescendantPath,
    DescendantDepth,
}
