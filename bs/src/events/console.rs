//! Console rendering for progress lines and the run summary

use std::path::Path;

use colored::{ColoredString, Colorize};

use super::types::{ProgressEvent, Severity};
use crate::domain::RunSummary;

/// Where user-facing console output goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleSink {
    Stdout,
    /// Used when stdout is reserved for machine-readable output
    Stderr,
    Silent,
}

impl ConsoleSink {
    pub fn line(&self, line: &str) {
        match self {
            ConsoleSink::Stdout => println!("{}", line),
            ConsoleSink::Stderr => eprintln!("{}", line),
            ConsoleSink::Silent => {}
        }
    }

    pub fn progress(&self, event: &ProgressEvent) {
        if *self != ConsoleSink::Silent {
            self.line(&format_progress(event));
        }
    }

    /// Run-level notice (startup info, warnings) outside any task
    pub fn notice(&self, severity: Severity, message: &str) {
        if *self != ConsoleSink::Silent {
            self.line(&paint(message, severity).to_string());
        }
    }
}

fn paint(text: &str, severity: Severity) -> ColoredString {
    match severity {
        Severity::Info => text.cyan(),
        Severity::Attempt => text.yellow(),
        Severity::Success => text.green(),
        Severity::Error => text.red(),
    }
}

/// Format one progress line: `[time] [Task N] message`
pub fn format_progress(event: &ProgressEvent) -> String {
    let body = format!("[Task {}] {}", event.task_index, event.message);
    format!("[{}] {}", event.at.format("%H:%M:%S %Y-%m-%d"), paint(&body, event.severity))
}

/// Render the end-of-run summary table
pub fn render_summary_table(summary: &RunSummary, success_file: &Path, fail_file: &Path) -> String {
    let headers = ["Total Tasks", "Success", "Fail", "Output Files"];
    let cells = [
        summary.total_tasks.to_string(),
        summary.success_count.to_string(),
        summary.fail_count.to_string(),
        format!("{}, {}", success_file.display(), fail_file.display()),
    ];
    let colors = [Severity::Info, Severity::Success, Severity::Error, Severity::Attempt];

    let widths: Vec<usize> = headers
        .iter()
        .zip(cells.iter())
        .map(|(h, c)| h.chars().count().max(c.chars().count()))
        .collect();

    let border = widths
        .iter()
        .fold(String::from("+"), |acc, w| format!("{}{}+", acc, "-".repeat(w + 2)));

    // Pad before painting so escape codes don't skew the widths
    let header_row = headers
        .iter()
        .zip(widths.iter())
        .zip(colors.iter())
        .fold(String::from("|"), |acc, ((h, w), sev)| {
            format!("{} {} |", acc, paint(&format!("{:<w$}", h, w = *w), *sev))
        });

    let value_row = cells
        .iter()
        .zip(widths.iter())
        .fold(String::from("|"), |acc, (c, w)| format!("{} {:<w$} |", acc, c, w = *w));

    [border.clone(), header_row, border.clone(), value_row, border].join("\n")
}
