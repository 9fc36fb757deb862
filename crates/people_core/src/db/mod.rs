//! Document store connection and bootstrap entry points.
//!
//! # Responsibility
//! - Resolve connection strings into SQLite targets.
//! - Open one long-lived connection and bootstrap the `people` collection.
//!
//! # Invariants
//! - Bootstrap version is tracked via `PRAGMA user_version`.
//! - No person data is read or written before bootstrap succeeds.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod uri;

pub use open::{connect, connect_from_env, open_db, open_db_in_memory};
pub use uri::{parse_connection_string, StoreTarget};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Connection string is empty or uses an unsupported scheme.
    InvalidConnectionString(String),
    /// Configuration needed to locate the store is missing or invalid.
    Config(crate::config::ConfigError),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidConnectionString(message) => {
                write!(f, "invalid connection string: {message}")
            }
            Self::Config(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Config(err) => Some(err),
            Self::InvalidConnectionString(_) => None,
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<crate::config::ConfigError> for DbError {
    fn from(value: crate::config::ConfigError) -> Self {
        Self::Config(value)
    }
}
