//! Database migrations

use sea_orm_migration::prelude::*;

mod m20250210_000001_create_users;
mod m20250210_000002_create_files;
mod m20250211_000001_create_file_shares;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250210_000001_create_users::Migration),
            Box::new(m20250210_000002_create_files::Migration),
            Box::new(m20250211_000001_create_file_shares::Migration),
        ]
    }
}
