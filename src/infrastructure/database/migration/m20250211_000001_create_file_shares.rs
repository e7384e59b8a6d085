//! Create the file shares table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Lookup table constraining share types
        manager
            .create_table(
                Table::create()
                    .table(FileShareTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileShareTypes::Type)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        for share_type in ["read", "write", "share"] {
            manager
                .exec_stmt(
                    Query::insert()
                        .into_table(FileShareTypes::Table)
                        .columns([FileShareTypes::Type])
                        .values_panic([share_type.into()])
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(FileShares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FileShares::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FileShares::Type).string().not_null())
                    .col(ColumnDef::new(FileShares::FileId).uuid().not_null())
                    .col(ColumnDef::new(FileShares::UserId).uuid().not_null())
                    .col(ColumnDef::new(FileShares::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(FileShares::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_shares_type")
                            .from(FileShares::Table, FileShares::Type)
                            .to(FileShareTypes::Table, FileShareTypes::Type),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_shares_file_id")
                            .from(FileShares::Table, FileShares::FileId)
                            .to(Files::Table, Files::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_shares_user_id")
                            .from(FileShares::Table, FileShares::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_file_shares_created_by")
                            .from(FileShares::Table, FileShares::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // The authorization join probes shares from both sides.
        manager
            .create_index(
                Index::create()
                    .name("file_shares_file_id_idx")
                    .table(FileShares::Table)
                    .col(FileShares::FileId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("file_shares_user_id_idx")
                    .table(FileShares::Table)
                    .col(FileShares::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FileShares::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(FileShareTypes::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum FileShareTypes {
    Table,
    Type,
}

#[derive(DeriveIden)]
enum FileShares {
    Table,
    Id,
    Type,
    FileId,
    UserId,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Files {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
