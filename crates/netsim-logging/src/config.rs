//! Logging configuration
//!
//! Deserialized from the `[log]` table of the simulator config. The presets
//! back the CLI flags: `-v` selects [`LogConfig::verbose`] and `--log-dir`
//! selects [`LogConfig::run_log`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where log output goes and how much of it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level used when RUST_LOG is unset
    pub default_level: String,
    pub console: ConsoleConfig,
    /// JSONL log file; `None` keeps logs on the console only
    pub file: Option<FileConfig>,
    pub jsonl: JsonlConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            console: ConsoleConfig::default(),
            file: None,
            jsonl: JsonlConfig::default(),
        }
    }
}

impl LogConfig {
    /// Per-tick tracing on a coloured console
    pub fn verbose() -> Self {
        Self {
            default_level: "debug".to_string(),
            ..Self::default()
        }
    }

    /// Keep a JSONL record of every run in `dir`, one file per day
    ///
    /// The console stays on but without colour, since run logs are usually
    /// captured from unattended sessions.
    pub fn run_log(dir: PathBuf) -> Self {
        Self {
            console: ConsoleConfig {
                ansi: false,
                ..ConsoleConfig::default()
            },
            file: Some(FileConfig {
                directory: dir,
                ..FileConfig::default()
            }),
            ..Self::default()
        }
    }

    /// Warnings only, no colour
    pub fn testing() -> Self {
        Self {
            default_level: "warn".to_string(),
            console: ConsoleConfig {
                ansi: false,
                ..ConsoleConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Console output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Human-readable lines; JSONL when false
    pub pretty: bool,
    pub ansi: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pretty: true,
            ansi: true,
        }
    }
}

/// Log file location and rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub directory: PathBuf,
    /// File name stem; rotated files get a date suffix
    pub prefix: String,
    pub rotation: RotationStrategy,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./logs"),
            prefix: "netsim".to_string(),
            rotation: RotationStrategy::Daily,
        }
    }
}

/// How often a new log file is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationStrategy {
    #[default]
    Daily,
    Hourly,
    /// One file, truncated at startup
    Never,
}

/// Shape of each JSONL record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonlConfig {
    /// Put event fields at the top level instead of under `fields`
    pub flatten_events: bool,
    /// Add the enclosing spans to each record
    pub include_spans: bool,
    /// Add source file and line
    pub include_location: bool,
}

impl Default for JsonlConfig {
    fn default() -> Self {
        Self {
            flatten_events: true,
            include_spans: true,
            include_location: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LogConfig::default();
        assert_eq!(config.default_level, "info");
        assert!(config.console.enabled);
        assert!(config.console.pretty);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_verbose_only_raises_level() {
        let config = LogConfig::verbose();
        assert_eq!(config.default_level, "debug");
        assert!(config.console.ansi);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_run_log_writes_daily_files() {
        let config = LogConfig::run_log(PathBuf::from("/tmp/netsim-runs"));
        assert!(config.console.enabled);
        assert!(!config.console.ansi);
        let file = config.file.unwrap();
        assert_eq!(file.directory, PathBuf::from("/tmp/netsim-runs"));
        assert_eq!(file.prefix, "netsim");
        assert_eq!(file.rotation, RotationStrategy::Daily);
    }

    #[test]
    fn test_testing_config_is_quiet() {
        let config = LogConfig::testing();
        assert_eq!(config.default_level, "warn");
        assert!(!config.console.ansi);
    }
}
