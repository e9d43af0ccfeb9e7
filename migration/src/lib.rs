pub use sea_orm_migration::prelude::*;

mod m20251001_000001_create_users;
mod m20251001_000002_create_profiles;
mod m20251001_000003_create_companies;
mod m20251001_000004_create_vehicles;
mod m20251001_000005_create_trips;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251001_000001_create_users::Migration),
            Box::new(m20251001_000002_create_profiles::Migration),
            Box::new(m20251001_000003_create_companies::Migration),
            Box::new(m20251001_000004_create_vehicles::Migration),
            Box::new(m20251001_000005_create_trips::Migration),
        ]
    }
}
