//! Repository layer for the people collection.
//!
//! # Responsibility
//! - Define the store request contract used by the record access façade.
//! - Isolate SQLite query details from façade orchestration.
//!
//! # Invariants
//! - "Not found" is an absent result (`None` / empty vector), never an error,
//!   except for `save_person` which replaces a document by id.

pub mod person_repo;
