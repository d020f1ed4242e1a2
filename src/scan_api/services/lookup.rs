use poem_openapi::payload::Json;

use crate::domain::codes::{CodeKind, normalize_code};
use crate::providers::ProviderClient;
use crate::scan_api::models::{ErrorDto, LookupResultDto, ScanLookupResponseDto};

pub struct LookupService<'a> {
    pub providers: &'a ProviderClient,
}

impl<'a> LookupService<'a> {
    pub fn new(providers: &'a ProviderClient) -> Self {
        Self { providers }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn lookup(&self, raw: &str) -> ScanLookupResponseDto {
        let Some(code) = normalize_code(raw) else {
            return ScanLookupResponseDto::BadRequest(Json(ErrorDto {
                error: "Unsupported code. Expected ISBN-10/13 or ASIN.".to_string(),
            }));
        };

        if code.kind == CodeKind::Asin {
            return ScanLookupResponseDto::Ok(Json(LookupResultDto {
                kind: code.kind.as_str().to_string(),
                value: code.value,
                book: None,
                error: Some("ASIN detected. No supported provider yet. Skipping.".to_string()),
            }));
        }

        match self.providers.fetch_with_fallback(&code.value).await {
            Some(book) => {
                let book = match serde_json::to_value(&book) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize book record");
                        serde_json::Value::Null
                    }
                };
                ScanLookupResponseDto::Ok(Json(LookupResultDto {
                    kind: code.kind.as_str().to_string(),
                    value: code.value,
                    book: Some(book),
                    error: None,
                }))
            }
            None => ScanLookupResponseDto::Ok(Json(LookupResultDto {
                kind: code.kind.as_str().to_string(),
                value: code.value,
                book: None,
                error: Some(
                    "No result from OpenLibrary/Google Books for this ISBN.".to_string(),
                ),
            })),
        }
    }
}
