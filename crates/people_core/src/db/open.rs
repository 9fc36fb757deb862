//! Connection bootstrap for the people store.
//!
//! # Responsibility
//! - Open the single long-lived connection used by repositories.
//! - Configure connection pragmas and bootstrap the `people` collection.
//!
//! # Invariants
//! - Returned connections have bootstrap fully applied.
//! - Every attempt emits exactly one terminal `db_connect` event.

use super::migrations::apply_migrations;
use super::uri::{parse_connection_string, StoreTarget};
use super::DbResult;
use crate::config::StoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens the store named by a connection string.
///
/// # Side effects
/// - Emits `db_connect` logging events with duration and status.
///
/// # Errors
/// - Returns `InvalidConnectionString` before touching the filesystem.
/// - Returns SQLite and bootstrap errors unchanged.
pub fn connect(connection_string: &str) -> DbResult<Connection> {
    let target = match parse_connection_string(connection_string) {
        Ok(target) => target,
        Err(err) => {
            error!(
                "event=db_connect module=db status=error error_code=invalid_connection_string error={}",
                err
            );
            return Err(err);
        }
    };

    match &target {
        StoreTarget::Memory => open_target(target.mode(), Connection::open_in_memory),
        StoreTarget::File(path) => open_target(target.mode(), || Connection::open(path)),
    }
}

/// Loads `StoreConfig` from the process environment and connects.
pub fn connect_from_env() -> DbResult<Connection> {
    let config = StoreConfig::from_env()?;
    connect(&config.db_uri)
}

/// Opens a file-backed store and applies pending bootstrap scripts.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_target("file", || Connection::open(path))
}

/// Opens a private in-memory store and applies pending bootstrap scripts.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_target("memory", Connection::open_in_memory)
}

fn open_target(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_connect module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_connect module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_connect module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_connect module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)?;
    Ok(())
}
