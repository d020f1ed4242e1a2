// Scan workflow controller: owns the last lookup result and the debounce
// timer, turns user input into API calls, and renders outcomes into a
// ScanView. Every operation catches its own errors; nothing here panics
// the host and nothing is retried automatically.

pub mod debounce;
pub mod prefs;
pub mod transport;
pub mod view;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use debounce::DebounceTimer;
use prefs::{PREF_MAX_AGE, PrefStore, SCANNER_DELAY_KEY, SCANNER_MODE_KEY};
use transport::ApiTransport;
use view::{BookPreview, RefreshReportLine, RefreshReportView, ScanView, StatusTone};

pub const DEFAULT_SCAN_DELAY_MS: u64 = 250;
pub const MIN_SCAN_DELAY_MS: u64 = 50;
pub const MAX_SCAN_DELAY_MS: u64 = 2000;

/// Parsed `/api/scan/lookup` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LookupResult {
    pub kind: String,
    pub value: String,
    #[serde(default)]
    pub book: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Events emitted back to the host loop.
#[derive(Debug)]
pub enum ScanEvent {
    /// The debounce window elapsed; the host should run this lookup.
    LookupDue { code: String },
}

pub struct ScanWorkflow<V: ScanView> {
    transport: Arc<dyn ApiTransport>,
    view: V,
    prefs: Box<dyn PrefStore>,
    timer: DebounceTimer,
    events_tx: UnboundedSender<ScanEvent>,
    last_lookup: Option<LookupResult>,
    saved: bool,
    scanner_mode: bool,
    delay_ms: u64,
}

impl<V: ScanView> ScanWorkflow<V> {
    /// Build a workflow, restoring scanner-mode and delay preferences.
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        view: V,
        prefs: Box<dyn PrefStore>,
    ) -> (Self, UnboundedReceiver<ScanEvent>) {
        let (events_tx, events_rx) = unbounded_channel();
        let scanner_mode = prefs.get(SCANNER_MODE_KEY).is_some_and(|v| v == "1");
        let delay_ms = prefs
            .get(SCANNER_DELAY_KEY)
            .and_then(|v| v.trim().parse().ok())
            .map(clamp_delay)
            .unwrap_or(DEFAULT_SCAN_DELAY_MS);

        let workflow = ScanWorkflow {
            transport,
            view,
            prefs,
            timer: DebounceTimer::default(),
            events_tx,
            last_lookup: None,
            saved: false,
            scanner_mode,
            delay_ms,
        };
        (workflow, events_rx)
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn scanner_mode(&self) -> bool {
        self.scanner_mode
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Save is only available while the current lookup carries a book that
    /// has not been saved yet.
    pub fn can_save(&self) -> bool {
        !self.saved && self.last_lookup.as_ref().is_some_and(|l| l.book.is_some())
    }

    pub fn set_scanner_mode(&mut self, enabled: bool) {
        self.scanner_mode = enabled;
        if !enabled {
            self.timer.cancel();
        }
        self.prefs
            .set(SCANNER_MODE_KEY, if enabled { "1" } else { "0" }, PREF_MAX_AGE);
    }

    pub fn set_delay_ms(&mut self, raw_ms: u64) {
        self.delay_ms = clamp_delay(raw_ms);
        self.prefs
            .set(SCANNER_DELAY_KEY, &self.delay_ms.to_string(), PREF_MAX_AGE);
    }

    /// Input changed. In scanner mode this (re)schedules the debounced
    /// lookup; only the last input within the window takes effect.
    pub fn input_changed(&mut self, text: &str) {
        if !self.scanner_mode {
            return;
        }
        let code = text.trim().to_string();
        if code.is_empty() {
            self.timer.cancel();
            return;
        }
        let tx = self.events_tx.clone();
        self.timer
            .schedule(Duration::from_millis(self.delay_ms), move || {
                let _ = tx.send(ScanEvent::LookupDue { code });
            });
    }

    pub async fn handle_event(&mut self, event: ScanEvent) {
        match event {
            ScanEvent::LookupDue { code } => self.lookup(&code).await,
        }
    }

    /// Explicit lookup (button / Enter). Cancels any pending debounce so
    /// the same code is not looked up twice.
    pub async fn trigger_lookup(&mut self, code: &str) {
        self.timer.cancel();
        self.lookup(code.trim()).await;
    }

    async fn lookup(&mut self, code: &str) {
        if code.is_empty() {
            return;
        }

        self.last_lookup = None;
        self.saved = false;
        self.view.clear_preview();
        self.view.set_save_enabled(false);
        self.view
            .set_status(&format!("Looking up {code}…"), StatusTone::Info);

        match self
            .transport
            .post_json("/api/scan/lookup", Some(json!({ "code": code })))
            .await
        {
            Ok(value) => match serde_json::from_value::<LookupResult>(value) {
                Ok(result) => self.render_lookup(result),
                Err(_) => {
                    self.view
                        .set_status("Malformed lookup response", StatusTone::Error);
                }
            },
            Err(e) => {
                self.view.set_status(&error_text(&e), StatusTone::Error);
            }
        }
    }

    fn render_lookup(&mut self, result: LookupResult) {
        if let Some(error) = result.error.as_deref().filter(|e| !e.is_empty()) {
            self.view.set_status(error, StatusTone::Error);
            self.last_lookup = Some(result);
            return;
        }

        match &result.book {
            None => {
                self.view.set_status(
                    &format!("No book data for {} {}", result.kind.to_uppercase(), result.value),
                    StatusTone::Error,
                );
            }
            Some(book) => {
                let preview = build_preview(book);
                self.view.show_preview(&preview);
                self.view.set_save_enabled(true);
                self.view.set_status(
                    &format!("OK: {} {}", result.kind.to_uppercase(), result.value),
                    StatusTone::Ok,
                );
            }
        }
        self.last_lookup = Some(result);
    }

    /// Save the current book. No-op without one; disabled after success
    /// until a new successful lookup; stays available for retry after a
    /// failure.
    pub async fn save(&mut self) {
        if !self.can_save() {
            return;
        }
        let book = self
            .last_lookup
            .as_ref()
            .and_then(|l| l.book.clone())
            .unwrap_or(Value::Null);

        self.view.set_status("Saving…", StatusTone::Info);
        match self
            .transport
            .post_json("/api/books", Some(json!({ "book": book })))
            .await
        {
            Ok(value) => {
                let id = value
                    .pointer("/saved/id")
                    .and_then(Value::as_str)
                    .unwrap_or("?")
                    .to_string();
                self.saved = true;
                self.view.set_save_enabled(false);
                self.view.set_status(&format!("Saved: {id}"), StatusTone::Ok);
            }
            Err(e) => {
                self.view.set_status(&error_text(&e), StatusTone::Error);
            }
        }
    }

    /// Bulk refresh. The host is responsible for asking the user first.
    pub async fn refresh_all(&mut self, dry_run: bool, only_missing: bool) {
        self.view
            .set_status("Refreshing all books…", StatusTone::Info);
        match self
            .transport
            .post_json(
                "/api/books/refresh",
                Some(json!({ "dry_run": dry_run, "only_missing": only_missing })),
            )
            .await
        {
            Ok(value) => {
                let report = build_refresh_view(&value);
                self.view.show_refresh_report(&report);
                self.view.set_status(&report.summary, StatusTone::Ok);
            }
            Err(e) => {
                self.view.set_status(&error_text(&e), StatusTone::Error);
            }
        }
    }
}

fn clamp_delay(ms: u64) -> u64 {
    ms.clamp(MIN_SCAN_DELAY_MS, MAX_SCAN_DELAY_MS)
}

fn error_text(e: &anyhow::Error) -> String {
    let text = e.to_string();
    if text.trim().is_empty() {
        "Unexpected error".to_string()
    } else {
        text
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn build_preview(book: &Value) -> BookPreview {
    let authors = book
        .get("authors")
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    let mut meta: Vec<String> = Vec::new();
    if let Some(date) = str_field(book, "publish_date") {
        meta.push(date.to_string());
    }
    if let Some(pages) = book.get("nb_pages").and_then(Value::as_i64) {
        meta.push(format!("{pages} pages"));
    }
    if let Some(language) = str_field(book, "language") {
        meta.push(language.to_string());
    }

    BookPreview {
        title: str_field(book, "title").unwrap_or("(untitled)").to_string(),
        subtitle: str_field(book, "subtitle").map(String::from),
        authors,
        meta: meta.join(" · "),
        sources: provider_summary(book.get("sources")),
        cover_url: str_field(book, "cover_image").map(String::from),
    }
}

fn provider_summary(sources: Option<&Value>) -> String {
    let mut seen = std::collections::HashSet::new();
    sources
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|s| s.get("provider").and_then(Value::as_str))
                .filter(|p| !p.is_empty() && seen.insert(p.to_string()))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default()
}

fn build_refresh_view(value: &Value) -> RefreshReportView {
    let count = |key: &str| {
        value
            .pointer(&format!("/counts/{key}"))
            .and_then(Value::as_i64)
            .unwrap_or(0)
    };
    let summary = format!(
        "Done: {} updated · {} skipped · {} failed",
        count("updated"),
        count("skipped"),
        count("failed")
    );

    let lines = value
        .get("updated_items")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let mut title = str_field(item, "title").unwrap_or("(untitled)").to_string();
                    if let Some(subtitle) = str_field(item, "subtitle") {
                        title = format!("{title} — {subtitle}");
                    }
                    let sources = item
                        .get("sources")
                        .and_then(Value::as_array)
                        .map(|s| {
                            s.iter()
                                .filter_map(Value::as_str)
                                .collect::<Vec<_>>()
                                .join(", ")
                        })
                        .unwrap_or_default();
                    RefreshReportLine {
                        title,
                        sources,
                        isbn: str_field(item, "isbn").map(String::from),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    RefreshReportView { summary, lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prefs::MemoryPrefStore;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::time::Instant;

    struct MockTransport {
        calls: Mutex<Vec<(String, Value)>>,
        responses: Mutex<VecDeque<Result<Value, String>>>,
    }

    impl MockTransport {
        fn new(responses: Vec<Result<Value, String>>) -> Arc<Self> {
            Arc::new(MockTransport {
                calls: Mutex::new(Vec::new()),
                responses: Mutex::new(responses.into()),
            })
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ApiTransport for MockTransport {
        async fn post_json(&self, path: &str, payload: Option<Value>) -> anyhow::Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((path.to_string(), payload.unwrap_or(Value::Null)));
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(value)) => Ok(value),
                Some(Err(message)) => Err(anyhow::anyhow!(message)),
                None => Ok(Value::Null),
            }
        }
    }

    #[derive(Default)]
    struct RecordingView {
        statuses: Vec<(String, StatusTone)>,
        previews: Vec<BookPreview>,
        cleared: usize,
        save_enabled: bool,
        reports: Vec<RefreshReportView>,
    }

    impl RecordingView {
        fn last_status(&self) -> &(String, StatusTone) {
            self.statuses.last().expect("no status set")
        }
    }

    impl ScanView for RecordingView {
        fn set_status(&mut self, text: &str, tone: StatusTone) {
            self.statuses.push((text.to_string(), tone));
        }
        fn clear_preview(&mut self) {
            self.cleared += 1;
        }
        fn show_preview(&mut self, preview: &BookPreview) {
            self.previews.push(preview.clone());
        }
        fn set_save_enabled(&mut self, enabled: bool) {
            self.save_enabled = enabled;
        }
        fn show_refresh_report(&mut self, report: &RefreshReportView) {
            self.reports.push(report.clone());
        }
    }

    fn clean_code_lookup() -> Value {
        json!({
            "kind": "isbn",
            "value": "9780132350884",
            "book": {
                "title": "Clean Code",
                "authors": ["Robert C. Martin"],
                "publish_date": "2008-08-01",
                "nb_pages": 431,
                "sources": [{ "provider": "openlibrary" }]
            }
        })
    }

    fn workflow_with(
        transport: Arc<MockTransport>,
        prefs: MemoryPrefStore,
    ) -> (ScanWorkflow<RecordingView>, UnboundedReceiver<ScanEvent>) {
        ScanWorkflow::new(transport, RecordingView::default(), Box::new(prefs))
    }

    #[tokio::test]
    async fn successful_lookup_enables_save() {
        let transport = MockTransport::new(vec![Ok(clean_code_lookup())]);
        let (mut wf, _events) = workflow_with(transport.clone(), MemoryPrefStore::default());

        wf.trigger_lookup("  9780132350884 ").await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/api/scan/lookup");
        assert_eq!(calls[0].1, json!({ "code": "9780132350884" }));

        assert_eq!(
            wf.view().last_status(),
            &("OK: ISBN 9780132350884".to_string(), StatusTone::Ok)
        );
        assert_eq!(wf.view().previews[0].title, "Clean Code");
        assert_eq!(wf.view().previews[0].authors, "Robert C. Martin");
        assert_eq!(wf.view().previews[0].meta, "2008-08-01 · 431 pages");
        assert_eq!(wf.view().previews[0].sources, "openlibrary");
        assert!(wf.view().save_enabled);
        assert!(wf.can_save());
    }

    #[tokio::test]
    async fn lookup_error_payload_disables_save() {
        let transport = MockTransport::new(vec![Ok(json!({
            "kind": "isbn",
            "value": "9780132350884",
            "book": null,
            "error": "Not found"
        }))]);
        let (mut wf, _events) = workflow_with(transport, MemoryPrefStore::default());

        wf.trigger_lookup("9780132350884").await;

        assert_eq!(
            wf.view().last_status(),
            &("Not found".to_string(), StatusTone::Error)
        );
        assert!(!wf.view().save_enabled);
        assert!(!wf.can_save());
        assert!(wf.view().previews.is_empty());
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_status() {
        let transport = MockTransport::new(vec![Err("HTTP 502".to_string())]);
        let (mut wf, _events) = workflow_with(transport, MemoryPrefStore::default());

        wf.trigger_lookup("9780132350884").await;

        assert_eq!(
            wf.view().last_status(),
            &("HTTP 502".to_string(), StatusTone::Error)
        );
        assert!(!wf.can_save());
    }

    #[tokio::test]
    async fn save_disables_until_next_successful_lookup() {
        let transport = MockTransport::new(vec![
            Ok(clean_code_lookup()),
            Ok(json!({ "saved": { "id": "book_isbn_9780132350884_clean-code" } })),
            Ok(clean_code_lookup()),
        ]);
        let (mut wf, _events) = workflow_with(transport.clone(), MemoryPrefStore::default());

        wf.trigger_lookup("9780132350884").await;
        assert!(wf.can_save());

        wf.save().await;
        assert_eq!(
            wf.view().last_status(),
            &(
                "Saved: book_isbn_9780132350884_clean-code".to_string(),
                StatusTone::Ok
            )
        );
        assert!(!wf.view().save_enabled);
        assert!(!wf.can_save());

        // guarded no-op: no extra request
        wf.save().await;
        assert_eq!(transport.calls().len(), 2);

        // a new successful lookup re-enables save
        wf.trigger_lookup("9780132350884").await;
        assert!(wf.can_save());
    }

    #[tokio::test]
    async fn failed_save_leaves_retry_possible() {
        let transport = MockTransport::new(vec![
            Ok(clean_code_lookup()),
            Err("HTTP 500".to_string()),
            Ok(json!({ "saved": { "id": "book_1" } })),
        ]);
        let (mut wf, _events) = workflow_with(transport.clone(), MemoryPrefStore::default());

        wf.trigger_lookup("9780132350884").await;
        wf.save().await;
        assert_eq!(
            wf.view().last_status(),
            &("HTTP 500".to_string(), StatusTone::Error)
        );
        assert!(wf.can_save());

        wf.save().await;
        assert!(!wf.can_save());
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn save_without_book_is_a_no_op() {
        let transport = MockTransport::new(vec![]);
        let (mut wf, _events) = workflow_with(transport.clone(), MemoryPrefStore::default());

        wf.save().await;
        assert!(transport.calls().is_empty());
        assert!(wf.view().statuses.is_empty());
    }

    #[tokio::test]
    async fn empty_code_is_ignored() {
        let transport = MockTransport::new(vec![]);
        let (mut wf, _events) = workflow_with(transport.clone(), MemoryPrefStore::default());

        wf.trigger_lookup("   ").await;
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_only_last_input_fires() {
        let transport = MockTransport::new(vec![]);
        let (mut wf, mut events) = workflow_with(transport, MemoryPrefStore::default());
        wf.set_scanner_mode(true);
        wf.set_delay_ms(100);

        let start = Instant::now();
        for code in ["9", "97", "978"] {
            wf.input_changed(code);
            tokio::time::sleep(Duration::from_millis(30)).await;
        }

        let event = events.recv().await.unwrap();
        let ScanEvent::LookupDue { code } = event;
        assert_eq!(code, "978");

        // fired ~100ms after the last input (which came at +60ms)
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(160));
        assert!(elapsed < Duration::from_millis(200));

        // and only once
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_lookup_cancels_pending_debounce() {
        let transport = MockTransport::new(vec![Ok(clean_code_lookup())]);
        let (mut wf, mut events) = workflow_with(transport.clone(), MemoryPrefStore::default());
        wf.set_scanner_mode(true);

        wf.input_changed("9780132350884");
        wf.trigger_lookup("9780132350884").await;

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert!(events.try_recv().is_err());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scanner_mode_off_ignores_input() {
        let transport = MockTransport::new(vec![]);
        let (mut wf, mut events) = workflow_with(transport, MemoryPrefStore::default());

        wf.input_changed("9780132350884");
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn delay_is_clamped_and_persisted() {
        let transport = MockTransport::new(vec![]);
        let (mut wf, _events) = workflow_with(transport, MemoryPrefStore::default());

        wf.set_delay_ms(10);
        assert_eq!(wf.delay_ms(), 50);
        wf.set_delay_ms(5000);
        assert_eq!(wf.delay_ms(), 2000);
        wf.set_delay_ms(250);
        assert_eq!(wf.delay_ms(), 250);
    }

    #[tokio::test]
    async fn preferences_are_restored_on_construction() {
        let transport = MockTransport::new(vec![]);
        let prefs = MemoryPrefStore::with(&[(SCANNER_MODE_KEY, "1"), (SCANNER_DELAY_KEY, "400")]);
        let (wf, _events) = workflow_with(transport, prefs);

        assert!(wf.scanner_mode());
        assert_eq!(wf.delay_ms(), 400);
    }

    #[tokio::test]
    async fn restored_delay_is_clamped() {
        let transport = MockTransport::new(vec![]);
        let prefs = MemoryPrefStore::with(&[(SCANNER_DELAY_KEY, "9999")]);
        let (wf, _events) = workflow_with(transport, prefs);
        assert_eq!(wf.delay_ms(), 2000);
    }

    #[tokio::test]
    async fn refresh_renders_summary_and_report() {
        let transport = MockTransport::new(vec![Ok(json!({
            "counts": { "updated": 2, "skipped": 1, "failed": 0 },
            "updated_items": [
                { "title": "A", "sources": ["openlibrary"], "isbn": "1111111111" },
                { "title": "B", "subtitle": "Second", "sources": ["openlibrary", "google_books"] }
            ]
        }))]);
        let (mut wf, _events) = workflow_with(transport.clone(), MemoryPrefStore::default());

        wf.refresh_all(false, true).await;

        let calls = transport.calls();
        assert_eq!(calls[0].0, "/api/books/refresh");
        assert_eq!(calls[0].1, json!({ "dry_run": false, "only_missing": true }));

        assert_eq!(
            wf.view().last_status(),
            &(
                "Done: 2 updated · 1 skipped · 0 failed".to_string(),
                StatusTone::Ok
            )
        );
        let report = &wf.view().reports[0];
        assert_eq!(report.lines.len(), 2);
        assert_eq!(report.lines[0].title, "A");
        assert_eq!(report.lines[0].isbn.as_deref(), Some("1111111111"));
        assert_eq!(report.lines[1].title, "B — Second");
        assert_eq!(report.lines[1].sources, "openlibrary, google_books");
    }

    #[tokio::test]
    async fn refresh_failure_shows_error() {
        let transport = MockTransport::new(vec![Err("HTTP 500".to_string())]);
        let (mut wf, _events) = workflow_with(transport, MemoryPrefStore::default());

        wf.refresh_all(false, false).await;
        assert_eq!(
            wf.view().last_status(),
            &("HTTP 500".to_string(), StatusTone::Error)
        );
        assert!(wf.view().reports.is_empty());
    }
}
