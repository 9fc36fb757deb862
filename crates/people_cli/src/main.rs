//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify configuration, logging and store connectivity end to end.
//! - Keep output deterministic for quick local sanity checks.

use people_core::{PersonService, SqlitePersonRepository, StoreConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(count) => {
            println!("people_core version={}", people_core::core_version());
            println!("people_core documents={count}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("people_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<u64, String> {
    let config = StoreConfig::from_env().map_err(|err| err.to_string())?;
    people_core::init_logging_from_config(&config)?;

    let conn = people_core::connect(&config.db_uri).map_err(|err| err.to_string())?;
    let repo = SqlitePersonRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let count = PersonService::new(repo)
        .count_people()
        .map_err(|err| err.to_string())?;
    log::info!("event=cli_probe module=cli status=ok documents={count}");
    Ok(count)
}
