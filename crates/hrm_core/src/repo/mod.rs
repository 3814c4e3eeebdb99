//! Repository layer: record store and directory persistence.
//!
//! # Responsibility
//! - Define the data-access contracts injected into shells and lists.
//! - Keep SQLite details behind those contracts.
//!
//! # Invariants
//! - Write paths validate before any SQL mutation.
//! - APIs return semantic errors (`NotFound`, `Conflict`) in addition to
//!   transport errors.

pub mod department_repo;
pub mod error;
pub mod record_store;
