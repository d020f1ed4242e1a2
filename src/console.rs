//! Interactive terminal client for the scan workflow. Reads codes and
//! commands from stdin, drives a `ScanWorkflow` over HTTP, and prints
//! what the workflow renders.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::workflow::prefs::FilePrefStore;
use crate::workflow::transport::HttpTransport;
use crate::workflow::view::{BookPreview, RefreshReportView, ScanView, StatusTone};
use crate::workflow::ScanWorkflow;

/// Renders workflow output as plain terminal lines.
#[derive(Debug, Default)]
struct ConsoleView;

impl ScanView for ConsoleView {
    fn set_status(&mut self, text: &str, tone: StatusTone) {
        let prefix = match tone {
            StatusTone::Info => "..",
            StatusTone::Ok => "ok",
            StatusTone::Error => "!!",
        };
        println!("[{prefix}] {text}");
    }

    fn clear_preview(&mut self) {}

    fn show_preview(&mut self, preview: &BookPreview) {
        println!();
        match &preview.subtitle {
            Some(subtitle) => println!("  {} — {}", preview.title, subtitle),
            None => println!("  {}", preview.title),
        }
        if !preview.authors.is_empty() {
            println!("  by {}", preview.authors);
        }
        if !preview.meta.is_empty() {
            println!("  {}", preview.meta);
        }
        if !preview.sources.is_empty() {
            println!("  sources: {}", preview.sources);
        }
        if let Some(cover) = &preview.cover_url {
            println!("  cover: {cover}");
        }
        println!();
    }

    fn set_save_enabled(&mut self, enabled: bool) {
        if enabled {
            println!("     type 'save' to add this book");
        }
    }

    fn show_refresh_report(&mut self, report: &RefreshReportView) {
        for line in &report.lines {
            match &line.isbn {
                Some(isbn) => println!("  updated: {} [{}] ({})", line.title, isbn, line.sources),
                None => println!("  updated: {} ({})", line.title, line.sources),
            }
        }
    }
}

fn print_help() {
    println!("Type an ISBN/ASIN to look it up. Commands:");
    println!("  save                              save the previewed book");
    println!("  refresh [--dry-run] [--only-missing]  refresh all books");
    println!("  mode on|off                       toggle scanner mode");
    println!("  delay <ms>                        set scanner debounce delay");
    println!("  help                              show this message");
    println!("  quit                              exit");
}

pub async fn run(config: &Config) -> anyhow::Result<()> {
    let transport =
        HttpTransport::new(&config.api_base_url).context("failed to build HTTP client")?;
    let prefs = FilePrefStore::open(&config.prefs_path);
    let (mut workflow, mut events) =
        ScanWorkflow::new(Arc::new(transport), ConsoleView, Box::new(prefs));

    println!("shelfscan console — connected to {}", config.api_base_url);
    println!(
        "scanner mode: {}, delay: {}ms",
        if workflow.scanner_mode() { "on" } else { "off" },
        workflow.delay_ms()
    );
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                workflow.handle_event(event).await;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else { break };
                if !handle_line(&mut workflow, &mut lines, line.trim()).await? {
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Returns false when the user asked to quit.
async fn handle_line(
    workflow: &mut ScanWorkflow<ConsoleView>,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    line: &str,
) -> anyhow::Result<bool> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None => {}
        Some("quit") | Some("exit") => return Ok(false),
        Some("help") => print_help(),
        Some("save") => workflow.save().await,
        Some("mode") => match parts.next() {
            Some("on") => {
                workflow.set_scanner_mode(true);
                println!("scanner mode on");
            }
            Some("off") => {
                workflow.set_scanner_mode(false);
                println!("scanner mode off");
            }
            _ => println!("usage: mode on|off"),
        },
        Some("delay") => match parts.next().and_then(|v| v.parse().ok()) {
            Some(ms) => {
                workflow.set_delay_ms(ms);
                println!("scanner delay: {}ms", workflow.delay_ms());
            }
            None => println!("usage: delay <ms>"),
        },
        Some("refresh") => {
            let rest: Vec<&str> = parts.collect();
            let dry_run = rest.contains(&"--dry-run");
            let only_missing = rest.contains(&"--only-missing");
            if dry_run || confirm(lines).await? {
                workflow.refresh_all(dry_run, only_missing).await;
            } else {
                println!("cancelled");
            }
        }
        Some(_) => {
            // anything else is a code
            if workflow.scanner_mode() {
                workflow.input_changed(line);
            } else {
                workflow.trigger_lookup(line).await;
            }
        }
    }
    Ok(true)
}

async fn confirm(
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
) -> anyhow::Result<bool> {
    println!("Refresh every saved book from the providers? [y/N]");
    let answer = lines
        .next_line()
        .await
        .context("failed to read stdin")?
        .unwrap_or_default();
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
