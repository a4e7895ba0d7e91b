// Sat Oct 17 2026 - Alex

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use colored::*;

use crate::launch::{LaunchReport, Verdict};
use crate::race::{RaceOutcome, RaceStatus};
use crate::ui::table::{Alignment, TableBuilder};

fn status_cell(status: RaceStatus, use_color: bool) -> String {
    let label = status.label().to_uppercase();
    if !use_color {
        return label;
    }
    match status {
        RaceStatus::Success => label.green().bold().to_string(),
        RaceStatus::Ambiguous => label.yellow().to_string(),
        RaceStatus::Failed => label.red().bold().to_string(),
        RaceStatus::Cancelled => label.dimmed().to_string(),
    }
}

fn seconds(value: Option<f64>) -> String {
    value.map(|s| format!("{:.2}s", s)).unwrap_or_else(|| "-".to_string())
}

/// Console summary of a multi-agent run.
pub fn render_launch_summary(report: &LaunchReport, tz: Tz, use_color: bool) -> String {
    let first_start = report.started_at.values().min().copied();
    let mut table = TableBuilder::new()
        .with_headers(&["#", "Registrant", "Result", "Time", "Exit", "Start"])
        .with_color(use_color)
        .with_alignment(0, Alignment::Right)
        .with_alignment(3, Alignment::Right)
        .with_alignment(4, Alignment::Right)
        .with_alignment(5, Alignment::Right);

    for (i, (name, outcome)) in report.outcomes.iter().enumerate() {
        let start = match (report.started_at.get(name), first_start) {
            (Some(at), Some(first)) => format!("+{}ms", (*at - first).num_milliseconds()),
            _ => "-".to_string(),
        };
        table = table.add_row(&[
            (i + 1).to_string(),
            name.clone(),
            outcome.status.label().to_uppercase(),
            format!("{:.2}s", outcome.elapsed_seconds),
            outcome.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
            start,
        ]);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Tournament {} - registration opened {}\n",
        report.tournament_id,
        report.window.opens_at_in(tz).format("%d-%m-%Y %H:%M:%S %Z")
    ));
    let rendered = table.build();
    let rendered = if use_color {
        color_status_labels(&rendered, report)
    } else {
        rendered
    };
    out.push_str(&rendered);
    out.push('\n');

    let stats = &report.stats;
    out.push_str(&format!(
        "Registered: {}/{} ({:.0}%)   Failed: {}   Cancelled: {}\n",
        stats.successes, stats.total, stats.success_rate, stats.failures, stats.cancelled
    ));
    out.push_str(&format!(
        "Fastest: {}   Mean: {}",
        seconds(stats.fastest_seconds),
        seconds(stats.mean_seconds)
    ));
    if let Some(spread) = report.start_spread_ms() {
        out.push_str(&format!("   Start spread: {}ms", spread));
    }
    out.push('\n');

    let verdict = stats.verdict.to_string();
    let verdict = if !use_color {
        verdict
    } else {
        match stats.verdict {
            Verdict::AllRegistered => verdict.green().bold().to_string(),
            Verdict::Partial => verdict.yellow().bold().to_string(),
            Verdict::NoneRegistered => verdict.red().bold().to_string(),
        }
    };
    out.push_str(&verdict);
    out
}

/// Colors the labels after layout; escape codes would throw off column widths.
fn color_status_labels(rendered: &str, report: &LaunchReport) -> String {
    let mut out = rendered.to_string();
    let mut seen = Vec::new();
    for outcome in report.outcomes.values() {
        if seen.contains(&outcome.status) {
            continue;
        }
        seen.push(outcome.status);
        let plain = format!(" {} ", outcome.status.label().to_uppercase());
        let colored = format!(" {} ", status_cell(outcome.status, true));
        out = out.replace(&plain, &colored);
    }
    out
}

/// One-line result of a single race.
pub fn render_race_summary(outcome: &RaceOutcome, use_color: bool) -> String {
    let mut line = format!(
        "{}: {} after {:.2}s ({} attempt{})",
        outcome.registrant_id,
        status_cell(outcome.status, use_color),
        outcome.elapsed_seconds,
        outcome.attempts,
        if outcome.attempts == 1 { "" } else { "s" }
    );
    if let Some(status) = outcome.http_status {
        line.push_str(&format!(", HTTP {}", status));
    }
    if let Some(path) = &outcome.diagnostic {
        line.push_str(&format!(", page saved to {}", path.display()));
    }
    line
}

/// Writes launch reports as JSON under the log directory.
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_name(tournament_id: u32, at: DateTime<Utc>) -> String {
        format!("launch_{}_{}.json", tournament_id, at.format("%Y%m%d_%H%M%S"))
    }

    pub fn write(&self, report: &LaunchReport, at: DateTime<Utc>) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(Self::file_name(report.tournament_id, at));
        write_json(&path, report)?;
        Ok(path)
    }
}

fn write_json(path: &Path, report: &LaunchReport) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report).map_err(io::Error::from)?;
    writer.flush()
}
