//! Process configuration for the people store.
//!
//! # Responsibility
//! - Read the store connection string and logging options from the
//!   environment, optionally seeded from a `.env` file.
//!
//! # Invariants
//! - `PEOPLE_DB_URI` is required and never blank.
//! - Values already present in the environment win over `.env` entries.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_URI_VAR: &str = "PEOPLE_DB_URI";
pub const LOG_LEVEL_VAR: &str = "PEOPLE_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "PEOPLE_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is not set.
    MissingVar(&'static str),
    /// Variable is set but blank after trimming.
    EmptyVar(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingVar(name) => write!(f, "required environment variable `{name}` is not set"),
            Self::EmptyVar(name) => write!(f, "environment variable `{name}` cannot be empty"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Connection string handed to `db::connect`.
    pub db_uri: String,
    /// Log level override; `None` means `default_log_level()`.
    pub log_level: Option<String>,
    /// Directory for rolling log files; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Loads `.env` (if present) and reads configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing `.env` file is normal outside local development.
        let _ = dotenv::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_uri = match lookup(DB_URI_VAR) {
            None => return Err(ConfigError::MissingVar(DB_URI_VAR)),
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::EmptyVar(DB_URI_VAR))
            }
            Some(value) => value.trim().to_string(),
        };

        Ok(Self {
            db_uri,
            log_level: non_blank(lookup(LOG_LEVEL_VAR)),
            log_dir: non_blank(lookup(LOG_DIR_VAR)).map(PathBuf::from),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}
