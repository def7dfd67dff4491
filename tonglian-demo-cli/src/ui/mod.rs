//! Terminal output helpers
//!
//! Human-readable output goes to stdout, failures to stderr. `--json` output
//! bypasses everything here except [`json`].

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const LABEL_WIDTH: usize = 18;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Level {
    Success,
    Failure,
    Note,
    Caution,
}

impl Level {
    fn marker(self) -> ColoredString {
        match self {
            Level::Success => "✓".green().bold(),
            Level::Failure => "✗".red().bold(),
            Level::Note => "ℹ".blue().bold(),
            Level::Caution => "⚠".yellow().bold(),
        }
    }
}

fn status(level: Level, message: &str) {
    match level {
        Level::Failure => eprintln!("{} {}", level.marker(), message),
        _ => println!("{} {}", level.marker(), message),
    }
}

pub fn success(message: &str) {
    status(Level::Success, message);
}

pub fn error(message: &str) {
    status(Level::Failure, message);
}

pub fn info(message: &str) {
    status(Level::Note, message);
}

pub fn warning(message: &str) {
    status(Level::Caution, message);
}

/// Section title, preceded by a blank line.
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold().underline());
}

/// Aligned `label: value` line.
pub fn key_value(key: &str, value: &str) {
    println!("  {} {}", label(key).cyan(), value);
}

/// Like [`key_value`], skipped when the value is absent.
pub fn optional(key: &str, value: Option<impl ToString>) {
    if let Some(value) = value {
        key_value(key, &value.to_string());
    }
}

/// Spinner shown while a gateway round trip is in flight.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn separator() {
    println!("{}", "·".repeat(LABEL_WIDTH * 3).dimmed());
}

/// Pretty-printed JSON on stdout.
pub fn json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(pretty) => println!("{pretty}"),
        Err(e) => error(&format!("Cannot render JSON: {e}")),
    }
}

/// Format an amount in fen as yuan.
pub fn fen(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{sign}{}.{:02} CNY", abs / 100, abs % 100)
}

fn label(key: &str) -> String {
    format!("{:<width$}", format!("{key}:"), width = LABEL_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fen_formatting() {
        assert_eq!(fen(12345), "123.45 CNY");
        assert_eq!(fen(5), "0.05 CNY");
        assert_eq!(fen(-100), "-1.00 CNY");
        assert_eq!(fen(0), "0.00 CNY");
    }

    #[test]
    fn test_labels_are_aligned() {
        assert_eq!(label("State").len(), LABEL_WIDTH);
        assert!(label("State").starts_with("State:"));
        assert_eq!(label("A very long label name").trim_end(), "A very long label name:");
    }
}
