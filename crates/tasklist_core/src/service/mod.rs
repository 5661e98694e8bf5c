//! Core use-case services.
//!
//! # Responsibility
//! - Turn user intents into collection changes.
//! - Bridge the collection to slot storage without leaking storage details
//!   into the presentation layer.

pub mod persistence;
pub mod task_store;
