use std::io::{self, Write};

use crossterm::style::Stylize;
use serde::Serialize;

use crate::app::{ItemResult, MirrorSummary, Reporter};
use crate::domain::{DatasetRecord, DownloadOutcome};

/// Per-item console reporting, one color-tagged line per download
/// attempt: green for downloaded, red for not found, blue for already
/// on disk.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn note(&self, message: &str) {
        println!("{message}");
    }

    fn item(&self, item: &ItemResult) {
        let line = format!("{}: {}", item.outcome, item.key);
        let styled = match item.outcome {
            DownloadOutcome::Downloaded => line.green(),
            DownloadOutcome::NotFound => line.red(),
            DownloadOutcome::AlreadyExists => line.blue(),
        };
        println!("{styled}");
    }
}

pub fn print_summary(summary: &MirrorSummary) {
    println!(
        "{}: {} records, {} downloaded, {} already on disk, {} not found",
        summary.project,
        summary.records,
        summary.count(DownloadOutcome::Downloaded),
        summary.count(DownloadOutcome::AlreadyExists),
        summary.count(DownloadOutcome::NotFound),
    );
}

pub fn print_records(records: &[DatasetRecord]) {
    for record in records {
        println!(
            "{}\t{}\t{}\t{}",
            record.source_name, record.target_name, record.cube_dimensions, record.member_uid
        );
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &MirrorSummary) -> io::Result<()> {
        Self::print_json(summary)
    }

    pub fn print_records(records: &[DatasetRecord]) -> io::Result<()> {
        Self::print_json(&records)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl Reporter for JsonOutput {
    fn note(&self, _message: &str) {}
    fn item(&self, _item: &ItemResult) {}
}
