use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};
use tracing::error;

use crate::{
    daemon::storage::{database::SqliteStorage, DATABASE_FILE},
    utils::dir::documents_path,
};

use super::{
    output::{
        csv::CsvDocument, day_usage_report, most_used_apps_report, reflections_report,
        save_report, ReportKind, DEFAULT_MOST_USED_LIMIT,
    },
    Args,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

#[derive(Debug, Parser)]
pub struct ReportCommand {
    #[arg(value_enum, help = "Which report to export")]
    kind: ReportKind,
    #[arg(
        long,
        short,
        help = "Day of the `today` report, not accepted by other reports. Examples are \"yesterday\", \"2 days ago\", \"15/03/2025\""
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(
        long,
        short = 'n',
        default_value_t = DEFAULT_MOST_USED_LIMIT,
        help = "Number of applications in the `most-used` report"
    )]
    limit: usize,
    #[arg(
        long,
        short,
        help = "Directory for the report. Defaults to the documents folder"
    )]
    output: Option<PathBuf>,
    #[arg(long = "no-open", help = "Only write the file, don't open it")]
    no_open: bool,
}

/// Resolves the day of the `today` report. Without a date it is the day of `now`.
fn parse_day<Tz: TimeZone>(
    date: Option<&str>,
    style: DateStyle,
    now: DateTime<Tz>,
) -> Result<DateTime<Tz>>
where
    Tz::Offset: Copy,
{
    match date {
        None => Ok(now),
        Some(date) => parse_date_string(date, now, style.into()).map_err(|e| {
            Args::command()
                .error(
                    clap::error::ErrorKind::InvalidValue,
                    format!("Incorrect date '{date}': {e}"),
                )
                .into()
        }),
    }
}

/// `--date` only selects the day of the `today` report.
fn check_date_applies(command: &ReportCommand) -> Result<()> {
    if command.date.is_some() && command.kind != ReportKind::Today {
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ArgumentConflict,
                format!("--date can't be used with the {} report", command.kind),
            )
            .into());
    }
    Ok(())
}

fn build_report(command: &ReportCommand, storage: &SqliteStorage) -> Result<CsvDocument> {
    check_date_applies(command)?;
    match command.kind {
        ReportKind::MostUsed => most_used_apps_report(storage, command.limit),
        ReportKind::Reflections => reflections_report(storage),
        ReportKind::Today => {
            let day = parse_day(command.date.as_deref(), command.date_style, Local::now())?;
            day_usage_report(storage, day)
        }
    }
}

pub fn process_report_command(command: ReportCommand, app_dir: &Path) -> Result<()> {
    let storage = SqliteStorage::open(&app_dir.join(DATABASE_FILE))?;
    let document = build_report(&command, &storage)?;

    let output_dir = command
        .output
        .clone()
        .unwrap_or_else(|| documents_path(app_dir.to_path_buf()));
    let path = save_report(&document, &output_dir, command.kind)?;
    println!(
        "Saved {} report with {} row(s) to {}",
        command.kind,
        document.row_count(),
        path.display()
    );

    if !command.no_open {
        // The file is already written, failing to show it is not an error.
        if let Err(e) = open::that(&path) {
            error!("Failed to open {}: {e:?}", path.display());
        }
    }
    Ok(())
}
