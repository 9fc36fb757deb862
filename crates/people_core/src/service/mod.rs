//! Record access façade.
//!
//! # Responsibility
//! - Expose the fixed set of person operations to callers.
//! - Keep callers decoupled from storage details.

pub mod person_service;
