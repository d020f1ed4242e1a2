use poem_openapi::payload::Json;

use crate::scan_api::models::{ScannerStatusDto, ScannerStatusResponseDto};
use crate::scanner_status;

pub struct StatusService;

impl StatusService {
    #[tracing::instrument(level = "debug")]
    pub fn scanner_status() -> ScannerStatusResponseDto {
        let status = scanner_status::detect_scanner();
        ScannerStatusResponseDto::Ok(Json(ScannerStatusDto {
            ok: status.ok,
            message: status.message,
            candidates: status.candidates,
        }))
    }
}
