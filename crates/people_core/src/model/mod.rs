//! Domain model for person documents.
//!
//! # Responsibility
//! - Define the single record shape stored in the `people` collection.
//! - Keep creation input separate from store-assigned identity.
//!
//! # Invariants
//! - Every stored person is identified by a store-assigned `PersonId`.
//! - Records are flat values with no references to other records.

pub mod person;
