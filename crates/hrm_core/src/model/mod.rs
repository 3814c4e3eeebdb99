//! Domain model for employee records and their directories.
//!
//! # Responsibility
//! - Define canonical record shapes shared by store, drafts and views.
//! - Resolve loosely-typed legacy values into closed types at the boundary.
//!
//! # Invariants
//! - Every employee is identified by a stable `EmployeeId`.
//! - Status strings are always parsed into closed enums, never passed through.

pub mod department;
pub mod employee;
pub mod status;
pub mod validation;
