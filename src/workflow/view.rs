//! View binding for the scan workflow. The controller renders into this
//! trait; front ends (terminal, tests) decide how to display it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Ok,
    Error,
}

/// Display-ready book preview. Authors are pre-joined, the metadata line
/// already has empty fields filtered out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookPreview {
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: String,
    pub meta: String,
    pub sources: String,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReportLine {
    pub title: String,
    pub sources: String,
    pub isbn: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReportView {
    pub summary: String,
    pub lines: Vec<RefreshReportLine>,
}

pub trait ScanView: Send {
    fn set_status(&mut self, text: &str, tone: StatusTone);
    fn clear_preview(&mut self);
    fn show_preview(&mut self, preview: &BookPreview);
    fn set_save_enabled(&mut self, enabled: bool);
    fn show_refresh_report(&mut self, report: &RefreshReportView);
}
