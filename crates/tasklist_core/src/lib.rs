//! Core task list logic.
//! This crate is the single source of truth for task list invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, ConfiguredStore, StorageBackend, StorageConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    normalize_task_text, ParseTaskFilterError, Task, TaskCounts, TaskFilter, TaskId,
};
pub use model::task_id::{Clock, SystemClock, TaskIdAllocator};
pub use repo::file_slot::FileSlotStore;
pub use repo::slot_repo::{
    validate_slot_key, MemorySlotStore, SlotError, SlotResult, SlotStore, SqliteSlotStore,
};
pub use service::persistence::{
    decode_collection, encode_collection, DecodedCollection, LoadError, PersistenceBridge,
    PersistenceError, DEFAULT_SLOT_KEY,
};
pub use service::task_store::{StoreResult, TaskStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
