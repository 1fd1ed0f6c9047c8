use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use serde::Deserialize;

use crate::domain::recurrence::DEFAULT_MAX_OCCURRENCES;

pub const DEFAULT_DB_PATH: &str = ".huddle/huddle.sqlite";

/// Settings after flags, environment, and the optional TOML file are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: String,
    pub log_level: LevelFilter,
    pub max_occurrences: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            log_level: LevelFilter::Warn,
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfigFile {
    db_path: Option<String>,
    log_level: Option<String>,
    #[serde(default)]
    scheduling: RawScheduling,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScheduling {
    max_occurrences: Option<usize>,
}

impl Settings {
    /// `db_override` comes from `--db`/`HUDDLE_DB_PATH` and wins over the file.
    pub fn load(config_path: Option<&Path>, db_override: Option<&str>) -> Result<Self, ConfigError> {
        match config_path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml(&text, db_override)
            }
            None => Self::from_raw(RawConfigFile::default(), db_override),
        }
    }

    fn from_toml(raw: &str, db_override: Option<&str>) -> Result<Self, ConfigError> {
        let file: RawConfigFile = toml::from_str(raw)?;
        Self::from_raw(file, db_override)
    }

    fn from_raw(raw: RawConfigFile, db_override: Option<&str>) -> Result<Self, ConfigError> {
        let defaults = Settings::default();
        let log_level = match raw.log_level.as_deref() {
            Some(value) => parse_level(value)?,
            None => defaults.log_level,
        };
        let max_occurrences = match raw.scheduling.max_occurrences {
            Some(0) => {
                return Err(ConfigError::Invalid(
                    "scheduling.max_occurrences must be at least 1".to_string(),
                ))
            }
            Some(value) => value,
            None => defaults.max_occurrences,
        };
        let db_path = db_override
            .map(str::to_string)
            .or(raw.db_path)
            .unwrap_or(defaults.db_path);

        Ok(Self {
            db_path,
            log_level,
            max_occurrences,
        })
    }
}

fn parse_level(raw: &str) -> Result<LevelFilter, ConfigError> {
    raw.trim()
        .parse::<LevelFilter>()
        .map_err(|_| ConfigError::Invalid(format!("unknown log_level '{}'", raw)))
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Toml(err) => write!(f, "invalid config TOML: {}", err),
            ConfigError::Invalid(message) => write!(f, "{}", message),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Toml(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        ConfigError::Toml(value)
    }
}
