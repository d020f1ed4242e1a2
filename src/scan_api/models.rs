use poem_openapi::{ApiResponse, Object, payload::Json};

#[derive(Debug, Clone, Object)]
pub struct ErrorDto {
    /// Human-readable error message
    pub error: String,
}

// ===== Scan lookup =====

#[derive(Debug, Clone, Object)]
pub struct ScanLookupRequestDto {
    /// Raw scanner/keyboard input (ISBN-10/13 or ASIN, separators allowed)
    pub code: String,
}

#[derive(Debug, Clone, Object)]
pub struct LookupResultDto {
    pub kind: String,
    pub value: String,
    pub book: Option<serde_json::Value>,
    pub error: Option<String>,
}

#[derive(ApiResponse)]
pub enum ScanLookupResponseDto {
    /// Lookup performed (the payload's `error` field signals provider misses)
    #[oai(status = 200)]
    Ok(Json<LookupResultDto>),

    /// Unsupported code
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),
}

// ===== Books CRUD =====

#[derive(Debug, Clone, Object)]
pub struct BookCreateRequestDto {
    pub book: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Object)]
pub struct SavedBookDto {
    pub saved: serde_json::Value,
}

#[derive(ApiResponse)]
pub enum BookCreateResponseDto {
    /// Book saved
    #[oai(status = 201)]
    Created(Json<SavedBookDto>),

    /// Missing or invalid 'book' object
    #[oai(status = 400)]
    BadRequest(Json<ErrorDto>),

    /// Store error
    #[oai(status = 500)]
    Internal(Json<ErrorDto>),
}

#[derive(Debug, Clone, Object)]
pub struct BookListDto {
    pub items: Vec<serde_json::Value>,
    pub count: i64,
}

#[derive(ApiResponse)]
pub enum BookListResponseDto {
    #[oai(status = 200)]
    Ok(Json<BookListDto>),

    #[oai(status = 500)]
    Internal(Json<ErrorDto>),
}

#[derive(ApiResponse)]
pub enum BookGetResponseDto {
    #[oai(status = 200)]
    Ok(Json<serde_json::Value>),

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    #[oai(status = 500)]
    Internal(Json<ErrorDto>),
}

// ===== Refresh =====

#[derive(Debug, Clone, Default, Object)]
pub struct RefreshRequestDto {
    /// Log raw provider traffic at debug level
    #[oai(default)]
    pub debug: bool,
    /// Fetch fresh metadata but do not save
    #[oai(default)]
    pub dry_run: bool,
    /// Only refresh books with missing core fields
    #[oai(default)]
    pub only_missing: bool,
    /// Cap the number of books considered
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Default, Object)]
pub struct RefreshCountsDto {
    pub updated: i64,
    pub skipped: i64,
    pub failed: i64,
}

/// Checklist-friendly per-book refresh summary.
#[derive(Debug, Clone, Default, Object)]
pub struct RefreshItemDto {
    pub id: Option<String>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub sources: Vec<String>,
    pub status: Option<String>,
    pub reason: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Object)]
pub struct RefreshReportDto {
    pub counts: RefreshCountsDto,
    pub updated_items: Vec<RefreshItemDto>,
    pub skipped_items: Vec<RefreshItemDto>,
    pub failed_items: Vec<RefreshItemDto>,
}

#[derive(ApiResponse)]
pub enum RefreshResponseDto {
    #[oai(status = 200)]
    Ok(Json<RefreshReportDto>),

    #[oai(status = 500)]
    Internal(Json<ErrorDto>),
}

#[derive(Debug, Clone, Default, Object)]
pub struct RefreshOneDto {
    pub status: String,
    pub id: Option<String>,
    pub reason: Option<String>,
    pub error: Option<String>,
    /// Fresh metadata (dry-run only)
    pub book: Option<serde_json::Value>,
    /// Saved record (after a real refresh)
    pub saved: Option<serde_json::Value>,
}

#[derive(ApiResponse)]
pub enum RefreshOneResponseDto {
    #[oai(status = 200)]
    Ok(Json<RefreshOneDto>),

    #[oai(status = 404)]
    NotFound(Json<ErrorDto>),

    /// Refresh failed (no ISBN or no provider data)
    #[oai(status = 502)]
    BadGateway(Json<RefreshOneDto>),

    #[oai(status = 500)]
    Internal(Json<ErrorDto>),
}

// ===== Scanner status =====

#[derive(Debug, Clone, Object)]
pub struct ScannerStatusDto {
    pub ok: bool,
    pub message: String,
    pub candidates: Vec<String>,
}

#[derive(ApiResponse)]
pub enum ScannerStatusResponseDto {
    #[oai(status = 200)]
    Ok(Json<ScannerStatusDto>),
}
