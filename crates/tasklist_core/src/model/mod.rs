//! Task list domain model.
//!
//! # Responsibility
//! - Define the canonical task record and its filter/count projections.
//! - Provide pure list transformations used by the task store.
//!
//! # Invariants
//! - Every task is identified by a `TaskId` unique within one collection.
//! - Collection order is meaningful and independent of `created_at`.

pub mod task;
pub mod task_id;
pub mod task_list;
