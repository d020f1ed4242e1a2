//! Best-effort detection of an attached barcode scanner.
//!
//! HID keyboard-style scanners usually cannot be detected reliably; this
//! only reports devices whose names look scanner-ish.

use std::path::Path;
use std::process::Command;

const SCANNER_HINTS: [&str; 6] = [
    "scanner",
    "barcode",
    "symbol",
    "zebra",
    "honeywell",
    "datalogic",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ScannerStatus {
    pub ok: bool,
    pub message: String,
    pub candidates: Vec<String>,
}

pub fn detect_scanner() -> ScannerStatus {
    if cfg!(target_os = "linux") {
        detect_linux()
    } else {
        ScannerStatus {
            ok: false,
            message: format!(
                "Scanner detection not implemented for {} (common HID scanners still work).",
                std::env::consts::OS
            ),
            candidates: Vec::new(),
        }
    }
}

fn detect_linux() -> ScannerStatus {
    let mut candidates: Vec<String> = Vec::new();

    let by_id = Path::new("/dev/input/by-id");
    if let Ok(entries) = std::fs::read_dir(by_id) {
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            if looks_like_scanner(&name) {
                candidates.push(entry.path().to_string_lossy().into_owned());
            }
        }
    }

    if let Ok(out) = Command::new("lsusb").output()
        && out.status.success()
    {
        for line in String::from_utf8_lossy(&out.stdout).lines() {
            if looks_like_scanner(&line.to_lowercase()) {
                candidates.push(line.trim().to_string());
            }
        }
    }

    candidates.sort();
    candidates.dedup();

    if candidates.is_empty() {
        ScannerStatus {
            ok: false,
            message: "No obvious scanner detected. Note: HID keyboard-style scanners often can't be reliably detected.".to_string(),
            candidates,
        }
    } else {
        ScannerStatus {
            ok: true,
            message: "Scanner-like device detected (heuristic).".to_string(),
            candidates,
        }
    }
}

fn looks_like_scanner(name: &str) -> bool {
    SCANNER_HINTS.iter().any(|h| name.contains(h))
}
