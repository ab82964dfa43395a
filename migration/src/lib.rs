pub use sea_orm_migration::prelude::*;

mod m20261017_000001_create_staff_tables;
mod m20261017_000002_create_ticket_tables;
mod m20261017_000003_create_payment_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261017_000001_create_staff_tables::Migration),
            Box::new(m20261017_000002_create_ticket_tables::Migration),
            Box::new(m20261017_000003_create_payment_tables::Migration),
        ]
    }
}
