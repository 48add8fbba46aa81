pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users_adherents;
mod m20250901_000002_create_evenements;
mod m20250901_000003_create_dues_items;
mod m20250901_000004_create_paiements_cotisations;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users_adherents::Migration),
            Box::new(m20250901_000002_create_evenements::Migration),
            Box::new(m20250901_000003_create_dues_items::Migration),
            Box::new(m20250901_000004_create_paiements_cotisations::Migration),
        ]
    }
}
