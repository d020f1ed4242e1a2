use crate::m20260815_101200_create_books_table::Books;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_books_isbn")
                    .table(Books::Table)
                    .col(Books::Isbn)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_books_asin")
                    .table(Books::Table)
                    .col(Books::Asin)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_books_asin").to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_books_isbn").to_owned())
            .await?;

        Ok(())
    }
}
