//! SeaORM migrations for the playlist store

use sea_orm_migration::prelude::*;

pub mod m20260829_000001_initial_schema;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260829_000001_initial_schema::Migration)]
    }
}
