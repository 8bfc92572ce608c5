//! Configuration for the watcher and its command line front end.
//!
//! Settings are layered, later sources winning:
//! - Default values
//! - TOML configuration file (`.fswatch.toml`, searched upwards from the
//!   current directory, or an explicit path)
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `FSWATCH_` and use double
//! underscores to separate nested levels:
//! - `FSWATCH_DEBOUNCE_MS=250` sets `debounce_ms`
//! - `FSWATCH_MODE=direct` sets `mode`
//! - `FSWATCH_LOGGING__DEFAULT=debug` sets `logging.default`

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::watcher::WatchMode;

/// Name of the configuration file looked up by [`WatchSettings::load`].
pub const CONFIG_FILE_NAME: &str = ".fswatch.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FSWATCH_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchSettings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Files to watch (absolute)
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Watch the files themselves or their parent directories
    #[serde(default)]
    pub mode: WatchMode,

    /// Quiet period before a change is reported
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level for every target without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `fswatch = "debug"`
    #[serde(default)]
    pub modules: IndexMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_debounce_ms() -> u64 {
    crate::watcher::DEFAULT_DEBOUNCE.as_millis() as u64
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: Vec::new(),
            mode: WatchMode::default(),
            debounce_ms: default_debounce_ms(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: IndexMap::new(),
        }
    }
}

impl WatchSettings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_config().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file plus the environment.
    ///
    /// A missing file is not an error; defaults and environment apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(WatchSettings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore (__) separates nested levels
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.fswatch.toml` in the current directory or one of its ancestors.
    fn find_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Save current configuration to file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}
