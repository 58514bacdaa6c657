//! Runtime configuration.
//!
//! Values come from built-in defaults, then `WINDOW_MONITOR_*` environment
//! variables, then command-line flags, each layer overriding the last.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `WINDOW_MONITOR_DATA_DIR` | `<data dir>/window-monitor` | Database and settings location |
//! | `WINDOW_MONITOR_POLL_MS` | 1000 | Foreground window poll interval |
//! | `WINDOW_MONITOR_STOP_TIMEOUT_MS` | 2000 | Longest wait for the watcher to stop |
//! | `WINDOW_MONITOR_MIN_FLUSH_MS` | 100 | Shorter final segments are dropped |
//! | `WINDOW_MONITOR_WINDOW_TITLE` | `Window Monitor` | Title of the tracker's own terminal |
//! | `WINDOW_MONITOR_DEBUG` | unset | `1` or `true` enables debug logging |

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::sensing::WatcherConfig;

const APP_DIR_NAME: &str = "window-monitor";

const DEFAULT_POLL_MS: u64 = 1000;
const DEFAULT_STOP_TIMEOUT_MS: u64 = 2000;
const DEFAULT_MIN_FLUSH_MS: u64 = 100;
const DEFAULT_WINDOW_TITLE: &str = "Window Monitor";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to determine a data directory; set WINDOW_MONITOR_DATA_DIR")]
    NoDataDirectory,
}

/// Track which window you are working in, tagged with what you are doing.
#[derive(Parser, Debug, Default)]
#[command(name = "window-monitor")]
#[command(version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    WINDOW_MONITOR_DATA_DIR         Database and settings directory
    WINDOW_MONITOR_POLL_MS          Poll interval in milliseconds (default: 1000)
    WINDOW_MONITOR_STOP_TIMEOUT_MS  Watcher stop timeout in milliseconds (default: 2000)
    WINDOW_MONITOR_MIN_FLUSH_MS     Minimum final segment length (default: 100)
    WINDOW_MONITOR_WINDOW_TITLE     Own terminal title (default: Window Monitor)
    WINDOW_MONITOR_DEBUG            Set to 1 for debug logging
")]
pub struct Args {
    /// Directory holding the window log database and settings.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Foreground window poll interval in milliseconds.
    #[arg(long)]
    pub poll_ms: Option<u64>,

    /// How long stopping may wait for the last segment to be written.
    #[arg(long)]
    pub stop_timeout_ms: Option<u64>,

    /// Final segments shorter than this many milliseconds are not logged.
    #[arg(long)]
    pub min_flush_ms: Option<u64>,

    /// Title given to this terminal so it is never logged as a window.
    #[arg(long)]
    pub window_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub stop_timeout: Duration,
    pub min_flush_duration: Duration,
    pub window_title: String,
}

impl Config {
    pub fn load(args: Args) -> Result<Self, ConfigError> {
        Self::from_sources(args, |key| std::env::var(key).ok())
    }

    /// Resolve configuration with `lookup` standing in for the process
    /// environment.
    pub fn from_sources<F>(args: Args, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = match args
            .data_dir
            .or_else(|| lookup("WINDOW_MONITOR_DATA_DIR").map(PathBuf::from))
        {
            Some(dir) => dir,
            None => dirs::data_dir()
                .ok_or(ConfigError::NoDataDirectory)?
                .join(APP_DIR_NAME),
        };

        let poll_ms = match args.poll_ms {
            Some(ms) => ms,
            None => env_millis(&lookup, "WINDOW_MONITOR_POLL_MS", DEFAULT_POLL_MS)?,
        };
        if poll_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll interval".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        let stop_timeout_ms = match args.stop_timeout_ms {
            Some(ms) => ms,
            None => env_millis(
                &lookup,
                "WINDOW_MONITOR_STOP_TIMEOUT_MS",
                DEFAULT_STOP_TIMEOUT_MS,
            )?,
        };

        let min_flush_ms = match args.min_flush_ms {
            Some(ms) => ms,
            None => env_millis(&lookup, "WINDOW_MONITOR_MIN_FLUSH_MS", DEFAULT_MIN_FLUSH_MS)?,
        };

        let window_title = args
            .window_title
            .or_else(|| lookup("WINDOW_MONITOR_WINDOW_TITLE"))
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| DEFAULT_WINDOW_TITLE.to_string());

        Ok(Self {
            data_dir,
            poll_interval: Duration::from_millis(poll_ms),
            stop_timeout: Duration::from_millis(stop_timeout_ms),
            min_flush_duration: Duration::from_millis(min_flush_ms),
            window_title,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("window_log.sqlite3")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.json")
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            poll_interval: self.poll_interval,
            stop_timeout: self.stop_timeout,
            min_flush_duration: self.min_flush_duration,
            own_window_title: self.window_title.clone(),
        }
    }
}

fn env_millis<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(val) => val.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected milliseconds, got '{val}'"),
        }),
        None => Ok(default),
    }
}
