use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use teleinfo_meter::{PublishError, Reading, Sink};
use teleinfo_registry::{FieldKind, FieldValue, Label};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReadingOutput<'a> {
    label: Label,
    value: &'a FieldValue,
    description: &'static str,
    timestamp: String,
}

/// Prints published readings to `out`.
///
/// Table output is batched: rows collect until [`flush`](Self::flush).
pub struct ReadingSink<W> {
    out: W,
    format: OutputFormat,
    rows: Vec<Reading>,
    printed: usize,
    limit: Option<usize>,
}

impl<W: Write> ReadingSink<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            rows: Vec::new(),
            printed: 0,
            limit: None,
        }
    }

    /// Stop printing after `limit` readings.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn printed(&self) -> usize {
        self.printed
    }

    pub fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.printed >= limit)
    }

    pub fn flush(&mut self) -> Result<(), PublishError> {
        if !self.rows.is_empty() {
            let mut table = new_table(vec!["LABEL", "VALUE", "DESCRIPTION"]);
            for reading in self.rows.drain(..) {
                table.add_row(vec![
                    reading.label.to_string(),
                    reading.value.to_string(),
                    reading.label.description().to_string(),
                ]);
            }
            writeln!(self.out, "{table}")?;
        }
        self.out.flush()?;
        Ok(())
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for ReadingSink<W> {
    fn publish(&mut self, reading: &Reading) -> Result<(), PublishError> {
        if self.is_full() {
            return Ok(());
        }
        self.printed += 1;

        match self.format {
            OutputFormat::Json => {
                let out = ReadingOutput {
                    label: reading.label,
                    value: &reading.value,
                    description: reading.label.description(),
                    timestamp: now_unix_seconds(),
                };
                let line = serde_json::to_string(&out)
                    .map_err(|err| PublishError::Rejected(err.to_string()))?;
                writeln!(self.out, "{line}")?;
            }
            OutputFormat::Table => self.rows.push(reading.clone()),
            OutputFormat::Pretty => writeln!(
                self.out,
                "{:<8} {:>14}  {}",
                reading.label.to_string(),
                reading.value.to_string(),
                reading.label.description()
            )?,
            OutputFormat::Raw => writeln!(self.out, "{} {}", reading.label, reading.value)?,
        }
        Ok(())
    }
}

/// How one completed frame fared.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FrameStatus {
    Ok,
    ChecksumMismatch,
    Malformed,
}

impl FrameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameStatus::Ok => "ok",
            FrameStatus::ChecksumMismatch => "checksum-mismatch",
            FrameStatus::Malformed => "malformed",
        }
    }
}

#[derive(Serialize, Debug)]
pub struct FrameReport {
    pub frame: String,
    pub label: Option<String>,
    pub value: Option<String>,
    pub received: Option<char>,
    pub computed: Option<char>,
    pub status: FrameStatus,
}

pub fn print_frame_report(report: &FrameReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(report)),
        OutputFormat::Table => {
            let mut table = new_table(vec!["STATUS", "LABEL", "VALUE", "CHECKSUM", "FRAME"]);
            table.add_row(vec![
                report.status.as_str().to_string(),
                report.label.clone().unwrap_or_default(),
                report.value.clone().unwrap_or_default(),
                checksum_cell(report),
                report.frame.clone(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "{:<17} checksum={} frame={:?}",
            report.status.as_str(),
            checksum_cell(report),
            report.frame
        ),
        OutputFormat::Raw => println!("{}", report.frame),
    }
}

#[derive(Serialize)]
struct LabelOutput {
    label: Label,
    kind: FieldKind,
    publish_divisor: Option<u32>,
    description: &'static str,
}

pub fn print_labels(format: OutputFormat) {
    let rows = Label::ALL.iter().map(|&label| LabelOutput {
        label,
        kind: label.kind(),
        publish_divisor: label.publish_divisor(),
        description: label.description(),
    });

    match format {
        OutputFormat::Json => {
            for row in rows {
                println!("{}", to_json(&row));
            }
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["LABEL", "KIND", "PUBLISHED AS", "DESCRIPTION"]);
            for row in rows {
                table.add_row(vec![
                    row.label.to_string(),
                    kind_name(row.kind).to_string(),
                    divisor_cell(row.publish_divisor),
                    row.description.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!(
                    "{:<8} {:<8} {:<8} {}",
                    row.label.to_string(),
                    kind_name(row.kind),
                    divisor_cell(row.publish_divisor),
                    row.description
                );
            }
        }
        OutputFormat::Raw => {
            for row in rows {
                println!("{}", row.label);
            }
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ChecksumOutput<'a> {
    pub payload: &'a str,
    pub checksum: char,
    pub frame: String,
}

pub fn print_checksum(out: &ChecksumOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(out)),
        OutputFormat::Table => {
            let mut table = new_table(vec!["PAYLOAD", "CHECKSUM", "FRAME"]);
            table.add_row(vec![
                out.payload.to_string(),
                out.checksum.to_string(),
                format!("{:?}", out.frame),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "payload={:?} checksum={:?} frame={:?}",
            out.payload, out.checksum, out.frame
        ),
        OutputFormat::Raw => println!("{}", out.checksum),
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Numeric => "numeric",
        FieldKind::Text => "text",
    }
}

fn divisor_cell(divisor: Option<u32>) -> String {
    match divisor {
        Some(1000) => "kWh".to_string(),
        Some(other) => format!("/{other}"),
        None => "raw".to_string(),
    }
}

fn checksum_cell(report: &FrameReport) -> String {
    match (report.received, report.computed) {
        (Some(received), Some(computed)) if received == computed => received.to_string(),
        (Some(received), Some(computed)) => format!("{received} != {computed}"),
        _ => "-".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
