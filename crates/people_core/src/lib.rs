//! Data access core for the people document store.
//! This crate owns the `Person` document shape and every store request made on it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use db::{connect, connect_from_env, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LogTarget,
};
pub use model::person::{NewPerson, Person, PersonId, PersonValidationError};
pub use repo::person_repo::{
    parse_person_id, DeleteSummary, PersonQuery, PersonRepository, RepoError, RepoResult,
    SortOrder, SqlitePersonRepository,
};
pub use service::person_service::PersonService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
