use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A cataloged book. List-shaped metadata (authors, publishers, genres,
/// links, sources) is stored as JSON columns.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub isbn: Option<String>,
    pub isbn10: Option<String>,
    pub isbn13: Option<String>,
    pub asin: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Json,
    pub publish_date: Option<String>,
    pub nb_pages: Option<i32>,
    pub publishers: Json,
    pub genres: Json,
    pub language: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub links: Json,
    pub sources: Json,
    pub added_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
