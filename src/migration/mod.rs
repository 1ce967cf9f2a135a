pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_catalog;
mod m20250101_000002_create_users;
mod m20250101_000003_create_orders;
mod m20250101_000004_create_favorites;
mod m20250101_000005_create_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_catalog::Migration),
            Box::new(m20250101_000002_create_users::Migration),
            Box::new(m20250101_000003_create_orders::Migration),
            Box::new(m20250101_000004_create_favorites::Migration),
            Box::new(m20250101_000005_create_audit_logs::Migration),
        ]
    }
}
