pub mod daemon_path;
pub mod note;
pub mod output;
pub mod process;
pub mod report;

use std::{env, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use note::process_note_command;
use process::{kill_previous_servers, restart_server};
use report::{process_report_command, ReportCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{args::TrackerArgs, config::TrackerConfig, start_daemon},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX, DAEMON_PREFIX},
    },
};

use daemon_path::to_daemon_path;

#[derive(Parser, Debug)]
#[command(name = "focuslog", version, long_about = None)]
#[command(about = "Tracks which application is in front and reports where the time went", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Print logs to the console")]
    log: bool,
    #[arg(
        long = "log-filter",
        global = true,
        help = "Log level, e.g. info or trace. Falls back to RUST_LOG"
    )]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a tracking daemon, stopping a previous one")]
    Init {
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    #[command(
        about = "Run the tracker directly in current console. Used for debugging"
    )]
    Serve {
        #[command(flatten)]
        tracker: TrackerArgs,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Write down what you have been working on")]
    Note {
        #[arg(required = true, num_args = 1.., help = "Text of the note")]
        text: Vec<String>,
    },
    #[command(about = "Export a report as CSV and open it")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args.dir.map_or_else(create_application_default_path, Ok)?;

    let (prefix, default_level) = match args.commands {
        Commands::Serve { .. } => (DAEMON_PREFIX, LevelFilter::DEBUG),
        _ => (CLI_PREFIX, LevelFilter::WARN),
    };
    let logging_level = args
        .log_filter
        .or_else(|| args.log.then_some(LevelFilter::TRACE));
    enable_logging(
        prefix,
        &app_dir.join("logs"),
        logging_level,
        default_level,
        args.log,
    )?;

    match args.commands {
        Commands::Init { tracker } => {
            // Fail here rather than in the detached daemon, where nobody sees the error.
            TrackerConfig::load(&app_dir, &tracker)?;
            restart_server(&app_dir, &tracker)?;
            Ok(())
        }
        Commands::Stop {} => {
            let process_name = env::current_exe()?;
            kill_previous_servers(&to_daemon_path(process_name.clone()))?;
            kill_previous_servers(&process_name)?;
            Ok(())
        }
        Commands::Serve { tracker } => {
            let config = TrackerConfig::load(&app_dir, &tracker)?;
            start_daemon(app_dir, config).await
        }
        Commands::Note { text } => process_note_command(&text, &app_dir),
        Commands::Report { command } => process_report_command(command, &app_dir),
    }
}
