use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
pub struct DaemonArgs {
    #[arg(long, help = "Run in the current process instead of detaching")]
    pub force: bool,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    #[command(flatten)]
    pub tracker: TrackerArgs,
}

/// Tracker options that can be set on the command line. They take precedence over `config.json`.
#[derive(clap::Args, Debug, Clone, Default, PartialEq)]
pub struct TrackerArgs {
    #[arg(long = "interval", help = "Seconds between two samples of the foreground app")]
    pub interval_secs: Option<u64>,
    #[arg(
        long = "ignore",
        help = "Application name that doesn't count as an observation. Can be repeated"
    )]
    pub ignored_apps: Vec<String>,
    #[arg(
        long = "flush-on-exit",
        help = "Record the interval in progress when the daemon stops"
    )]
    pub flush_on_exit: bool,
}

impl TrackerArgs {
    /// Turns the options back into arguments, for handing them to a spawned daemon.
    pub fn to_command_args(&self) -> Vec<String> {
        let mut args = vec![];
        if let Some(interval) = self.interval_secs {
            args.push("--interval".to_string());
            args.push(interval.to_string());
        }
        for app in &self.ignored_apps {
            args.push("--ignore".to_string());
            args.push(app.clone());
        }
        if self.flush_on_exit {
            args.push("--flush-on-exit".to_string());
        }
        args
    }
}
