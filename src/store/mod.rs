// Persistence for cataloged books, keyed on isbn/asin.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use entities::book;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::domain::codes::{CodeKind, safe_slug};
use crate::domain::models::BookRecord;

pub struct BookStore {
    db: Arc<DatabaseConnection>,
}

impl BookStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        BookStore { db }
    }

    /// Insert or update a book, keyed on isbn (preferred) or asin.
    ///
    /// An existing row keeps its id and added_at; all metadata fields are
    /// replaced by the incoming record.
    #[tracing::instrument(level = "debug", skip(self, record))]
    pub async fn upsert(&self, record: BookRecord) -> anyhow::Result<BookRecord> {
        let (kind, value) = identifier_key(&record)?;
        let existing = self.find_by_identifier(kind, &value).await?;
        let now = Utc::now();

        let model = match existing {
            Some(current) => {
                let mut am = active_model_from(&record, &current.id, current.added_at, now);
                am.id = sea_orm::ActiveValue::Unchanged(current.id);
                am.update(self.db.as_ref())
                    .await
                    .with_context(|| format!("failed to update book {kind:?}:{value}"))?
            }
            None => {
                let id = new_item_id(kind, &value, record.title.as_deref());
                tracing::debug!(%id, "inserting new book");
                let am = active_model_from(&record, &id, now, now);
                am.insert(self.db.as_ref())
                    .await
                    .with_context(|| format!("failed to insert book {kind:?}:{value}"))?
            }
        };

        Ok(BookRecord::from_model(model))
    }

    pub async fn get(&self, id: &str) -> anyhow::Result<Option<BookRecord>> {
        let model = book::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(BookRecord::from_model))
    }

    /// All books, newest first, optionally filtered by a case-insensitive
    /// substring match over title and authors.
    pub async fn list(&self, query: Option<&str>) -> anyhow::Result<Vec<BookRecord>> {
        let rows = book::Entity::find()
            .order_by_desc(book::Column::AddedAt)
            .all(self.db.as_ref())
            .await?;

        let q = query.map(str::trim).unwrap_or("").to_lowercase();
        let records = rows
            .into_iter()
            .map(BookRecord::from_model)
            .filter(|r| {
                if q.is_empty() {
                    return true;
                }
                let hay = format!(
                    "{} {}",
                    r.title.as_deref().unwrap_or(""),
                    r.authors.join(" ")
                )
                .to_lowercase();
                hay.contains(&q)
            })
            .collect();
        Ok(records)
    }

    /// Stable-ordered books for a bulk refresh, optionally capped.
    pub async fn all(&self, limit: Option<u64>) -> anyhow::Result<Vec<BookRecord>> {
        let mut find = book::Entity::find().order_by_asc(book::Column::Id);
        if let Some(limit) = limit.filter(|l| *l > 0) {
            find = find.limit(limit);
        }
        let rows = find.all(self.db.as_ref()).await?;
        Ok(rows.into_iter().map(BookRecord::from_model).collect())
    }

    async fn find_by_identifier(
        &self,
        kind: CodeKind,
        value: &str,
    ) -> anyhow::Result<Option<book::Model>> {
        let filter = match kind {
            CodeKind::Isbn => book::Column::Isbn.eq(value),
            CodeKind::Asin => book::Column::Asin.eq(value),
        };
        Ok(book::Entity::find()
            .filter(filter)
            .one(self.db.as_ref())
            .await?)
    }
}

fn identifier_key(record: &BookRecord) -> anyhow::Result<(CodeKind, String)> {
    if let Some(isbn) = record.identifiers.isbn.as_deref().map(str::trim)
        && !isbn.is_empty()
    {
        return Ok((CodeKind::Isbn, isbn.to_string()));
    }
    if let Some(asin) = record.identifiers.asin.as_deref().map(str::trim)
        && !asin.is_empty()
    {
        return Ok((CodeKind::Asin, asin.to_string()));
    }
    anyhow::bail!("book identifiers must include isbn or asin")
}

fn new_item_id(kind: CodeKind, value: &str, title: Option<&str>) -> String {
    let title = match title {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => format!("book-{value}"),
    };
    let slug: String = safe_slug(&title).chars().take(32).collect();
    format!("book_{}_{}_{}", kind.as_str(), value, slug)
}

fn active_model_from(
    record: &BookRecord,
    id: &str,
    added_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
) -> book::ActiveModel {
    book::ActiveModel {
        id: Set(id.to_string()),
        isbn: Set(record.identifiers.isbn.clone()),
        isbn10: Set(record.identifiers.isbn10.clone()),
        isbn13: Set(record.identifiers.isbn13.clone()),
        asin: Set(record.identifiers.asin.clone()),
        title: Set(record.title.clone()),
        subtitle: Set(record.subtitle.clone()),
        authors: Set(serde_json::json!(record.authors)),
        publish_date: Set(record.publish_date.clone()),
        nb_pages: Set(record.nb_pages),
        publishers: Set(serde_json::json!(record.publishers)),
        genres: Set(serde_json::json!(record.genres)),
        language: Set(record.language.clone()),
        description: Set(record.description.clone()),
        cover_image: Set(record.cover_image.clone()),
        links: Set(serde_json::json!(record.links)),
        sources: Set(serde_json::json!(record.sources)),
        added_at: Set(added_at),
        updated_at: Set(updated_at),
    }
}
