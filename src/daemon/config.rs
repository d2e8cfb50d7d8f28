use std::{io::ErrorKind, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::{args::TrackerArgs, collection::ignored::LOGIN_WINDOW};

pub const CONFIG_FILE: &str = "config.json";

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Optional `config.json` in the application directory. Every field may be omitted.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub poll_interval_secs: Option<u64>,
    pub ignored_apps: Option<Vec<String>>,
    pub flush_on_exit: Option<bool>,
}

impl ConfigFile {
    /// Reads the config from `dir`. A missing file is the same as an empty one.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }
}

/// Settings of the tracking loop after merging defaults, `config.json` and command line.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    pub poll_interval: Duration,
    pub ignored_apps: Vec<String>,
    pub flush_on_exit: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            ignored_apps: vec![LOGIN_WINDOW.to_string()],
            flush_on_exit: false,
        }
    }
}

impl TrackerConfig {
    /// Command line values win over the file. Ignored apps given on the command line are added to
    /// the ones from the file.
    pub fn resolve(file: ConfigFile, args: &TrackerArgs) -> Result<Self> {
        let defaults = Self::default();

        let poll_interval = match args.interval_secs.or(file.poll_interval_secs) {
            Some(0) => bail!("Poll interval must be at least one second"),
            Some(v) => Duration::from_secs(v),
            None => defaults.poll_interval,
        };

        let mut ignored_apps = file.ignored_apps.unwrap_or(defaults.ignored_apps);
        for app in &args.ignored_apps {
            if !ignored_apps.contains(app) {
                ignored_apps.push(app.clone());
            }
        }

        Ok(Self {
            poll_interval,
            ignored_apps,
            flush_on_exit: args.flush_on_exit || file.flush_on_exit.unwrap_or(defaults.flush_on_exit),
        })
    }

    pub fn load(dir: &Path, args: &TrackerArgs) -> Result<Self> {
        Self::resolve(ConfigFile::load(dir)?, args)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{ConfigFile, TrackerConfig, CONFIG_FILE};
    use crate::daemon::args::TrackerArgs;

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = TrackerConfig::load(dir.path(), &TrackerArgs::default())?;
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.ignored_apps, vec!["loginwindow".to_string()]);
        assert!(!config.flush_on_exit);
        Ok(())
    }

    #[test]
    fn test_file_values_are_used() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{"poll_interval_secs": 2, "ignored_apps": ["ScreenSaverEngine"], "flush_on_exit": true}"#,
        )?;
        let config = TrackerConfig::load(dir.path(), &TrackerArgs::default())?;
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.ignored_apps, vec!["ScreenSaverEngine".to_string()]);
        assert!(config.flush_on_exit);
        Ok(())
    }

    #[test]
    fn test_args_override_file() -> Result<()> {
        let file = ConfigFile {
            poll_interval_secs: Some(2),
            ignored_apps: None,
            flush_on_exit: Some(false),
        };
        let args = TrackerArgs {
            interval_secs: Some(7),
            ignored_apps: vec!["lockscreen".into(), "loginwindow".into()],
            flush_on_exit: true,
        };
        let config = TrackerConfig::resolve(file, &args)?;
        assert_eq!(config.poll_interval, Duration::from_secs(7));
        assert_eq!(
            config.ignored_apps,
            vec!["loginwindow".to_string(), "lockscreen".to_string()]
        );
        assert!(config.flush_on_exit);
        Ok(())
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let args = TrackerArgs {
            interval_secs: Some(0),
            ..Default::default()
        };
        assert!(TrackerConfig::resolve(ConfigFile::default(), &args).is_err());
    }

    #[test]
    fn test_unknown_field_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{"poll_intervall": 2}"#)?;
        assert!(ConfigFile::load(dir.path()).is_err());
        Ok(())
    }
}
