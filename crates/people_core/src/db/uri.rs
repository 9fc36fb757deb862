//! Connection string parsing.
//!
//! Accepted forms:
//! - `:memory:`, `sqlite::memory:`, `sqlite://:memory:` for a private in-memory store.
//! - `sqlite://<path>` or `sqlite:<path>` for a file-backed store.
//! - A bare filesystem path.
//!
//! Any other `<scheme>://` prefix is rejected rather than treated as a path.

use super::{DbError, DbResult};
use std::path::PathBuf;

const SQLITE_URL_PREFIX: &str = "sqlite://";
const SQLITE_SHORT_PREFIX: &str = "sqlite:";
const MEMORY_TARGET: &str = ":memory:";

/// Resolved store location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    Memory,
    File(PathBuf),
}

impl StoreTarget {
    /// Short label used in log lines. Never includes the path.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}

/// Parses a connection string into a store target.
///
/// # Errors
/// - Returns `InvalidConnectionString` for blank input, unsupported schemes
///   and a scheme with an empty path.
pub fn parse_connection_string(raw: &str) -> DbResult<StoreTarget> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DbError::InvalidConnectionString(
            "connection string cannot be empty".to_string(),
        ));
    }

    let location = if let Some(rest) = trimmed.strip_prefix(SQLITE_URL_PREFIX) {
        rest
    } else if let Some(rest) = trimmed.strip_prefix(SQLITE_SHORT_PREFIX) {
        rest
    } else if let Some((scheme, _)) = trimmed.split_once("://") {
        return Err(DbError::InvalidConnectionString(format!(
            "unsupported scheme `{scheme}`; expected sqlite"
        )));
    } else {
        trimmed
    };

    match location {
        "" => Err(DbError::InvalidConnectionString(format!(
            "missing database path in `{trimmed}`"
        ))),
        MEMORY_TARGET => Ok(StoreTarget::Memory),
        path => Ok(StoreTarget::File(PathBuf::from(path))),
    }
}
