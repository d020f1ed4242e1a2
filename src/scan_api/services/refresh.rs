use poem_openapi::payload::Json;

use crate::domain::models::BookRecord;
use crate::providers::ProviderClient;
use crate::scan_api::models::{
    ErrorDto, RefreshCountsDto, RefreshItemDto, RefreshOneDto, RefreshOneResponseDto,
    RefreshReportDto, RefreshRequestDto, RefreshResponseDto,
};
use crate::store::BookStore;

pub struct RefreshService<'a> {
    pub store: &'a BookStore,
    pub providers: &'a ProviderClient,
}

enum RefreshOutcome {
    Updated { saved: BookRecord },
    DryRun { book: BookRecord },
    Failed { error: String },
}

impl<'a> RefreshService<'a> {
    pub fn new(store: &'a BookStore, providers: &'a ProviderClient) -> Self {
        Self { store, providers }
    }

    /// Re-fetch provider metadata for every stored book and upsert the
    /// result, producing a per-book report.
    #[tracing::instrument(level = "debug", skip(self, opts))]
    pub async fn refresh_all(&self, opts: RefreshRequestDto) -> RefreshResponseDto {
        if opts.debug {
            tracing::debug!(?opts, "bulk refresh requested");
        }

        let items = match self.store.all(opts.limit).await {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(error = %format!("{:?}", e), "failed to load books for refresh");
                return RefreshResponseDto::Internal(Json(ErrorDto {
                    error: e.to_string(),
                }));
            }
        };

        let mut report = RefreshReportDto::default();
        for current in items {
            if opts.only_missing && !current.needs_refresh() {
                report.counts.skipped += 1;
                report
                    .skipped_items
                    .push(summarize(&current, None, Some("not_missing"), None));
                continue;
            }

            match self.refresh_one_book(&current, opts.dry_run).await {
                RefreshOutcome::Updated { saved } => {
                    report.counts.updated += 1;
                    report
                        .updated_items
                        .push(summarize(&saved, Some("updated"), None, None));
                }
                RefreshOutcome::DryRun { book } => {
                    report.counts.updated += 1;
                    report
                        .updated_items
                        .push(summarize(&book, Some("dry_run"), None, None));
                }
                RefreshOutcome::Failed { error } => {
                    report.counts.failed += 1;
                    report
                        .failed_items
                        .push(summarize(&current, None, None, Some(&error)));
                }
            }
        }

        tracing::info!(
            updated = report.counts.updated,
            skipped = report.counts.skipped,
            failed = report.counts.failed,
            dry_run = opts.dry_run,
            "bulk refresh finished"
        );
        RefreshResponseDto::Ok(Json(report))
    }

    /// Single-book variant of the bulk refresh.
    #[tracing::instrument(level = "debug", skip(self, opts))]
    pub async fn refresh_one(
        &self,
        item_id: &str,
        opts: RefreshRequestDto,
    ) -> RefreshOneResponseDto {
        let current = match self.store.get(item_id).await {
            Ok(Some(current)) => current,
            Ok(None) => {
                return RefreshOneResponseDto::NotFound(Json(ErrorDto {
                    error: "Not found".to_string(),
                }));
            }
            Err(e) => {
                return RefreshOneResponseDto::Internal(Json(ErrorDto {
                    error: e.to_string(),
                }));
            }
        };

        if opts.only_missing && !current.needs_refresh() {
            return RefreshOneResponseDto::Ok(Json(RefreshOneDto {
                status: "skipped".to_string(),
                id: Some(item_id.to_string()),
                reason: Some("not_missing".to_string()),
                ..RefreshOneDto::default()
            }));
        }

        match self.refresh_one_book(&current, opts.dry_run).await {
            RefreshOutcome::Updated { saved } => RefreshOneResponseDto::Ok(Json(RefreshOneDto {
                status: "updated".to_string(),
                id: saved.id.clone().or_else(|| Some(item_id.to_string())),
                saved: serde_json::to_value(&saved).ok(),
                ..RefreshOneDto::default()
            })),
            RefreshOutcome::DryRun { book } => RefreshOneResponseDto::Ok(Json(RefreshOneDto {
                status: "dry_run".to_string(),
                id: Some(item_id.to_string()),
                book: serde_json::to_value(&book).ok(),
                ..RefreshOneDto::default()
            })),
            RefreshOutcome::Failed { error } => {
                RefreshOneResponseDto::BadGateway(Json(RefreshOneDto {
                    status: "failed".to_string(),
                    id: Some(item_id.to_string()),
                    error: Some(error),
                    ..RefreshOneDto::default()
                }))
            }
        }
    }

    /// Refresh a single book from its best ISBN; saves unless dry_run.
    async fn refresh_one_book(&self, current: &BookRecord, dry_run: bool) -> RefreshOutcome {
        let Some(isbn) = current.best_isbn().map(String::from) else {
            return RefreshOutcome::Failed {
                error: "No ISBN available to refresh.".to_string(),
            };
        };

        let Some(fresh) = self.providers.fetch_with_fallback(&isbn).await else {
            return RefreshOutcome::Failed {
                error: format!("No provider data for ISBN {isbn}."),
            };
        };

        if dry_run {
            return RefreshOutcome::DryRun { book: fresh };
        }

        match self.store.upsert(fresh).await {
            Ok(saved) => RefreshOutcome::Updated { saved },
            Err(e) => RefreshOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

fn summarize(
    record: &BookRecord,
    status: Option<&str>,
    reason: Option<&str>,
    error: Option<&str>,
) -> RefreshItemDto {
    RefreshItemDto {
        id: record.id.clone(),
        isbn: record.best_isbn().map(String::from),
        title: record.title.clone(),
        subtitle: record.subtitle.clone(),
        sources: record.providers(),
        status: status.map(String::from),
        reason: reason.map(String::from),
        error: error.map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Identifiers, SourceRef};

    #[test]
    fn summarize_carries_best_isbn_and_providers() {
        let record = BookRecord {
            id: Some("book_isbn_1_x".to_string()),
            identifiers: Identifiers {
                isbn: Some("111".to_string()),
                isbn13: Some("9780132350884".to_string()),
                ..Identifiers::default()
            },
            title: Some("Clean Code".to_string()),
            sources: vec![
                SourceRef {
                    provider: "openlibrary".to_string(),
                    provider_key: None,
                },
                SourceRef {
                    provider: "openlibrary".to_string(),
                    provider_key: Some("k".to_string()),
                },
            ],
            ..BookRecord::default()
        };

        let dto = summarize(&record, Some("updated"), None, None);
        assert_eq!(dto.isbn.as_deref(), Some("9780132350884"));
        assert_eq!(dto.sources, vec!["openlibrary"]);
        assert_eq!(dto.status.as_deref(), Some("updated"));
        assert!(dto.reason.is_none());
    }
}
