pub use sea_orm_migration::prelude::*;

mod m20261017_120000_create_storage_tables;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261017_120000_create_storage_tables::Migration)]
    }
}

pub struct Migrator;
