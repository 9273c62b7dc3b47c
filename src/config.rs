// Runtime configuration, read from an optional TOML file.
//
// Every field has a default, so an empty file (or no file) is valid:
//
// ```toml
// cache_dir = ".cache"
// cache_ttl_secs = 300
// refresh_interval_secs = 300
// fetch_timeout_secs = 10
//
// [source]
// kind = "sheet"
// sheet_id = "..."
// ```
use crate::cache::DEFAULT_CACHE_KEY;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    /// Published spreadsheet, fetched through its JSON query endpoint.
    Sheet {
        #[serde(default)]
        sheet_id: String,
    },
    Csv {
        path: PathBuf,
    },
    Json {
        path: PathBuf,
    },
    /// Always serve the built-in demo rows.
    Demo,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Sheet {
            sheet_id: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub cache_dir: PathBuf,
    pub cache_key: String,
    pub cache_ttl_secs: u64,
    pub refresh_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            source: SourceConfig::default(),
            cache_dir: PathBuf::from(".cache"),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            cache_ttl_secs: 5 * 60,
            refresh_interval_secs: 5 * 60,
            fetch_timeout_secs: 10,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_toml_str(&text)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
