//! Rendering of run reports for the terminal.
//!
//! Text output goes through [`report_lines`] so what a target prints can be
//! checked without capturing stdout. JSON output is the serialized
//! [`RunReport`] as-is.

use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use extbuild_lib::{Outcome, RunReport};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

mod symbols {
  pub const BUILT: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const IDLE: &str = "•";
}

/// One line of a rendered report.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
  Done(String),
  Note(String),
  Stat(&'static str, String),
}

/// Artifact sizes are shown to one decimal above a kilobyte.
pub fn format_size(bytes: u64) -> String {
  const KB: f64 = 1024.0;
  const MB: f64 = KB * 1024.0;

  let b = bytes as f64;
  if b >= MB {
    format!("{:.1} MB", b / MB)
  } else if b >= KB {
    format!("{:.1} KB", b / KB)
  } else {
    format!("{} B", bytes)
  }
}

/// Toolchain runs are reported in milliseconds, or seconds past one second.
pub fn format_elapsed(millis: u64) -> String {
  match millis {
    0..1000 => format!("{}ms", millis),
    1000..60_000 => format!("{}.{:02}s", millis / 1000, (millis % 1000) / 10),
    _ => format!("{}m {}s", millis / 60_000, (millis / 1000) % 60),
  }
}

fn file_name(path: &Path) -> String {
  path.file_name().unwrap_or(path.as_os_str()).to_string_lossy().into_owned()
}

/// The text lines describing `report`. Reads artifact sizes and the marker
/// timestamp from disk; a file that has gone missing is listed without them.
pub fn report_lines(report: &RunReport) -> Vec<Line> {
  match &report.outcome {
    Outcome::Built { artifacts } => {
      let mut lines: Vec<Line> = artifacts
        .iter()
        .map(|artifact| match std::fs::metadata(artifact) {
          Ok(metadata) => Line::Done(format!("Built {} ({})", file_name(artifact), format_size(metadata.len()))),
          Err(_) => Line::Done(format!("Built {}", file_name(artifact))),
        })
        .collect();
      lines.push(Line::Stat("Duration", format_elapsed(report.duration_ms)));
      lines
    }
    Outcome::WouldBuild => vec![Line::Note("Dry run - would rebuild".to_string())],
    Outcome::UpToDate => vec![Line::Note("nothing to do".to_string())],
    Outcome::Cleaned { removed } => vec![Line::Done(format!("Removed {} artifact(s)", removed))],
    Outcome::Refreshed { marker } => {
      let mut lines = vec![Line::Done(format!("Touched {}", file_name(marker)))];
      if let Ok(modified) = std::fs::metadata(marker).and_then(|m| m.modified()) {
        lines.push(Line::Stat(
          "Timestamp",
          humantime::format_rfc3339_seconds(modified).to_string(),
        ));
      }
      lines
    }
  }
}

/// Print `report` to stdout in the requested format.
pub fn print_report(report: &RunReport, format: OutputFormat) -> anyhow::Result<()> {
  if format.is_json() {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize report to JSON")?;
    println!("{}", json);
    return Ok(());
  }

  for line in report_lines(report) {
    match line {
      Line::Done(message) => println!(
        "{} {}",
        symbols::BUILT.if_supports_color(Stream::Stdout, |s| s.green()),
        message
      ),
      Line::Note(message) => println!(
        "{} {}",
        symbols::IDLE.if_supports_color(Stream::Stdout, |s| s.blue()),
        message
      ),
      Line::Stat(label, value) => println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value),
    }
  }
  Ok(())
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}
