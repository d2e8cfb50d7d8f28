//! Read-only views over the stored intervals and reflections, rendered as CSV.

pub mod analysis;
pub mod csv;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use analysis::{analyze_apps, AppUsage};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, TimeZone};
use clap::ValueEnum;
use csv::CsvDocument;
use tracing::info;

use crate::{daemon::storage::database::RecordStorage, utils::time::day_bounds};

const USAGE_HEADER: [&str; 2] = ["App Name", "Total Time (seconds)"];
const REFLECTIONS_HEADER: [&str; 2] = ["Timestamp", "Note"];

pub const DEFAULT_MOST_USED_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Applications with the most total time across all history.
    MostUsed,
    /// Every reflection in the order it was written.
    Reflections,
    /// Time per application for one day, today by default.
    Today,
}

impl ReportKind {
    /// Reports always overwrite the same file, so the viewer shows the latest one.
    pub fn file_name(&self) -> &'static str {
        match self {
            ReportKind::MostUsed => "Most_Used_Apps_Report.csv",
            ReportKind::Reflections => "Reflections_Report.csv",
            ReportKind::Today => "Todays_Usage_Report.csv",
        }
    }
}

impl Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::MostUsed => write!(f, "most-used"),
            ReportKind::Reflections => write!(f, "reflections"),
            ReportKind::Today => write!(f, "today"),
        }
    }
}

/// Top `limit` applications by total time across all history.
pub fn most_used_apps_report(storage: &impl RecordStorage, limit: usize) -> Result<CsvDocument> {
    let usages = storage
        .top_usage_totals(limit)?
        .into_iter()
        .map(|v| AppUsage {
            app_name: v.app_name,
            duration: v.total,
        });
    let mut document = CsvDocument::with_header(&USAGE_HEADER);
    for usage in usages {
        let seconds = usage.rounded_seconds().to_string();
        document.push_row([&*usage.app_name, seconds.as_str()]);
    }
    Ok(document)
}

/// Every reflection, oldest first.
pub fn reflections_report(storage: &impl RecordStorage) -> Result<CsvDocument> {
    let mut document = CsvDocument::with_header(&REFLECTIONS_HEADER);
    for reflection in storage.reflections()? {
        let timestamp = reflection
            .recorded_at
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        document.push_row([timestamp.as_str(), &*reflection.note]);
    }
    Ok(document)
}

/// Time per application for intervals that started on the calendar day of `day`, in the
/// timezone of `day`.
pub fn day_usage_report<Tz: TimeZone>(
    storage: &impl RecordStorage,
    day: DateTime<Tz>,
) -> Result<CsvDocument> {
    let (from, to) = day_bounds(day);
    let usages = analyze_apps(storage.usage_started_between(from, to)?);
    let mut document = CsvDocument::with_header(&USAGE_HEADER);
    for usage in usages {
        let seconds = usage.rounded_seconds().to_string();
        document.push_row([&*usage.app_name, seconds.as_str()]);
    }
    Ok(document)
}

/// Writes the report into `dir`, replacing a previous report of the same kind.
pub fn save_report(document: &CsvDocument, dir: &Path, kind: ReportKind) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create report directory {}", dir.display()))?;
    let path = dir.join(kind.file_name());
    std::fs::write(&path, document.as_str())
        .with_context(|| format!("failed to write report {}", path.display()))?;
    info!("Report saved at {}", path.display());
    Ok(path)
}
