use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Books::Table)
                    .if_not_exists()
                    .col(string(Books::Id).primary_key())
                    .col(string_null(Books::Isbn))
                    .col(string_null(Books::Isbn10))
                    .col(string_null(Books::Isbn13))
                    .col(string_null(Books::Asin))
                    .col(string_null(Books::Title))
                    .col(string_null(Books::Subtitle))
                    .col(json(Books::Authors))
                    .col(string_null(Books::PublishDate))
                    .col(integer_null(Books::NbPages))
                    .col(json(Books::Publishers))
                    .col(json(Books::Genres))
                    .col(string_null(Books::Language))
                    .col(text_null(Books::Description))
                    .col(string_null(Books::CoverImage))
                    .col(json(Books::Links))
                    .col(json(Books::Sources))
                    .col(timestamp(Books::AddedAt))
                    .col(timestamp(Books::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Books::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub enum Books {
    Table,
    Id,
    Isbn,
    Isbn10,
    Isbn13,
    Asin,
    Title,
    Subtitle,
    Authors,
    PublishDate,
    NbPages,
    Publishers,
    Genres,
    Language,
    Description,
    CoverImage,
    Links,
    Sources,
    AddedAt,
    UpdatedAt,
}
