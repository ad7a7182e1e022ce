//! Simulator configuration
//!
//! Everything is optional in the TOML file; missing keys fall back to the
//! defaults below.
//!
//! ```toml
//! language = "fr"
//! tick_interval_ms = 500
//!
//! [layout]
//! width = 1024.0
//! height = 768.0
//!
//! [log]
//! default_level = "debug"
//! ```

use std::path::Path;
use std::time::Duration;

use netsim_logging::LogConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{Language, Layout};

/// Configuration for the simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Area topologies are laid out in
    pub layout: Layout,
    /// Wall-clock time between animation ticks
    pub tick_interval_ms: u64,
    /// How long to wait for the explanation service
    pub explain_timeout_ms: u64,
    /// Language of result and fallback messages
    pub language: Language,
    /// Logging setup used by the CLI
    pub log: LogConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            tick_interval_ms: 1500,
            explain_timeout_ms: 10_000,
            language: Language::default(),
            log: LogConfig::default(),
        }
    }
}

impl SimConfig {
    /// Read a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse a TOML document
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn explain_timeout(&self) -> Duration {
        Duration::from_millis(self.explain_timeout_ms)
    }
}
