use poem_openapi::payload::Json;

use crate::domain::models::BookRecord;
use crate::scan_api::models::{
    BookCreateResponseDto, BookGetResponseDto, BookListDto, BookListResponseDto, ErrorDto,
    SavedBookDto,
};
use crate::store::BookStore;

pub struct BooksService<'a> {
    pub store: &'a BookStore,
}

impl<'a> BooksService<'a> {
    pub fn new(store: &'a BookStore) -> Self {
        Self { store }
    }

    #[tracing::instrument(level = "debug", skip(self, book))]
    pub async fn create(&self, book: Option<serde_json::Value>) -> BookCreateResponseDto {
        let record: BookRecord = match book.and_then(|v| serde_json::from_value(v).ok()) {
            Some(record) => record,
            None => {
                return BookCreateResponseDto::BadRequest(Json(ErrorDto {
                    error: "Missing or invalid 'book' object.".to_string(),
                }));
            }
        };

        match self.store.upsert(record).await {
            Ok(saved) => match serde_json::to_value(&saved) {
                Ok(value) => BookCreateResponseDto::Created(Json(SavedBookDto { saved: value })),
                Err(e) => BookCreateResponseDto::Internal(Json(ErrorDto {
                    error: e.to_string(),
                })),
            },
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), "failed to save book");
                BookCreateResponseDto::Internal(Json(ErrorDto {
                    error: e.to_string(),
                }))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list(&self, query: Option<&str>) -> BookListResponseDto {
        match self.store.list(query).await {
            Ok(records) => {
                let items: Vec<serde_json::Value> = records
                    .iter()
                    .filter_map(|r| serde_json::to_value(r).ok())
                    .collect();
                let count = items.len() as i64;
                BookListResponseDto::Ok(Json(BookListDto { items, count }))
            }
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), "failed to list books");
                BookListResponseDto::Internal(Json(ErrorDto {
                    error: e.to_string(),
                }))
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get(&self, item_id: &str) -> BookGetResponseDto {
        match self.store.get(item_id).await {
            Ok(Some(record)) => match serde_json::to_value(&record) {
                Ok(value) => BookGetResponseDto::Ok(Json(value)),
                Err(e) => BookGetResponseDto::Internal(Json(ErrorDto {
                    error: e.to_string(),
                })),
            },
            Ok(None) => BookGetResponseDto::NotFound(Json(ErrorDto {
                error: "Not found".to_string(),
            })),
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), item_id, "failed to load book");
                BookGetResponseDto::Internal(Json(ErrorDto {
                    error: e.to_string(),
                }))
            }
        }
    }
}
