// HTTP API surface, one handler per route; the actual work lives in the
// per-call services.

pub mod models;
pub mod services;

use std::sync::Arc;

use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::Json,
};

use crate::providers::ProviderClient;
use crate::store::BookStore;
use models::{
    BookCreateRequestDto, BookCreateResponseDto, BookGetResponseDto, BookListResponseDto,
    RefreshOneResponseDto, RefreshRequestDto, RefreshResponseDto, ScanLookupRequestDto,
    ScanLookupResponseDto, ScannerStatusResponseDto,
};
use services::{
    books::BooksService, lookup::LookupService, refresh::RefreshService, status::StatusService,
};

pub struct ShelfScanApi {
    pub store: Arc<BookStore>,
    pub providers: Arc<ProviderClient>,
}

#[OpenApi]
impl ShelfScanApi {
    /// Normalize a scanned code and look up bibliographic metadata
    #[oai(path = "/api/scan/lookup", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn scan_lookup(&self, body: Json<ScanLookupRequestDto>) -> ScanLookupResponseDto {
        LookupService::new(&self.providers).lookup(&body.0.code).await
    }

    /// Save a looked-up book into the catalog
    #[oai(path = "/api/books", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn books_create(&self, body: Json<BookCreateRequestDto>) -> BookCreateResponseDto {
        BooksService::new(&self.store).create(body.0.book).await
    }

    /// List cataloged books, newest first
    #[oai(path = "/api/books", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, q))]
    async fn books_list(
        &self,
        /// Case-insensitive substring match over title and authors
        Query(q): Query<Option<String>>,
    ) -> BookListResponseDto {
        BooksService::new(&self.store).list(q.as_deref()).await
    }

    /// Fetch one cataloged book
    #[oai(path = "/api/books/:item_id", method = "get")]
    #[tracing::instrument(level = "debug", skip(self, item_id))]
    async fn books_get(&self, item_id: Path<String>) -> BookGetResponseDto {
        BooksService::new(&self.store).get(&item_id.0).await
    }

    /// Re-fetch provider metadata for all cataloged books
    #[oai(path = "/api/books/refresh", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, body))]
    async fn books_refresh_all(&self, body: Json<RefreshRequestDto>) -> RefreshResponseDto {
        RefreshService::new(&self.store, &self.providers)
            .refresh_all(body.0)
            .await
    }

    /// Re-fetch provider metadata for one book
    #[oai(path = "/api/books/:item_id/refresh", method = "post")]
    #[tracing::instrument(level = "debug", skip(self, item_id, body))]
    async fn books_refresh_one(
        &self,
        item_id: Path<String>,
        body: Json<RefreshRequestDto>,
    ) -> RefreshOneResponseDto {
        RefreshService::new(&self.store, &self.providers)
            .refresh_one(&item_id.0, body.0)
            .await
    }

    /// Barcode-scanner device detection heuristic
    #[oai(path = "/api/scanner/status", method = "get")]
    #[tracing::instrument(level = "debug", skip(self))]
    async fn scanner_status(&self) -> ScannerStatusResponseDto {
        StatusService::scanner_status()
    }
}
