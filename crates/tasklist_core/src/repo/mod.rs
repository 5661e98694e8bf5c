//! Key-value slot storage abstractions and implementations.
//!
//! # Responsibility
//! - Define the single synchronous string-slot contract persistence relies on.
//! - Isolate SQLite/file/memory details from the task store.
//!
//! # Invariants
//! - A write replaces the whole slot value or fails; no partial values.
//! - Write failures are returned to the caller, never swallowed.

pub mod file_slot;
pub mod slot_repo;
