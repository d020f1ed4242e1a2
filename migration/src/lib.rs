pub use sea_orm_migration::prelude::*;

mod m20260815_101200_create_books_table;
mod m20260815_102431_create_books_identifier_index;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260815_101200_create_books_table::Migration),
            Box::new(m20260815_102431_create_books_identifier_index::Migration),
        ]
    }
}
