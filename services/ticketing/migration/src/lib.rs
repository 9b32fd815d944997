pub use sea_orm_migration::prelude::*;

mod m20260901_000001_create_users;
mod m20260901_000002_create_events;
mod m20260901_000003_create_consent_requests;
mod m20260901_000004_create_tickets;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260901_000001_create_users::Migration),
            Box::new(m20260901_000002_create_events::Migration),
            Box::new(m20260901_000003_create_consent_requests::Migration),
            Box::new(m20260901_000004_create_tickets::Migration),
        ]
    }
}
