//! Storage configuration and task store bootstrap.
//!
//! # Responsibility
//! - Describe where the task collection slot lives.
//! - Validate configuration before any storage is touched.
//! - Open a ready-to-use `TaskStore` for the configured backend.
//!
//! # Invariants
//! - File-system paths must be absolute.
//! - The slot key satisfies the slot key rule.

use crate::db::{open_db, open_db_in_memory};
use crate::repo::file_slot::FileSlotStore;
use crate::repo::slot_repo::{
    validate_slot_key, MemorySlotStore, SlotError, SlotResult, SlotStore, SqliteSlotStore,
};
use crate::service::persistence::{LoadError, PersistenceBridge, DEFAULT_SLOT_KEY};
use crate::service::task_store::TaskStore;
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Where slot values are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// SQLite database file.
    Sqlite { path: PathBuf },
    /// SQLite database living only as long as the store.
    SqliteInMemory,
    /// One JSON file per slot under `dir`.
    File { dir: PathBuf },
    /// Process memory only.
    Memory,
}

impl StorageBackend {
    fn label(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::SqliteInMemory => "sqlite_memory",
            Self::File { .. } => "file",
            Self::Memory => "memory",
        }
    }
}

/// Task storage configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Slot holding the serialized collection.
    pub slot_key: String,
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            backend: StorageBackend::SqliteInMemory,
        }
    }
}

/// Errors from configuration validation and store bootstrap.
#[derive(Debug)]
pub enum ConfigError {
    /// Slot key violates the key rule.
    InvalidSlotKey(String),
    /// A configured path is not absolute.
    RelativePath(PathBuf),
    /// Backend could not be opened.
    Storage(SlotError),
    /// Stored collection could not be read.
    Load(LoadError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSlotKey(key) => write!(f, "invalid slot key `{key}`"),
            Self::RelativePath(path) => {
                write!(f, "storage path must be absolute, got `{}`", path.display())
            }
            Self::Storage(err) => write!(f, "{err}"),
            Self::Load(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Load(err) => Some(err),
            Self::InvalidSlotKey(_) | Self::RelativePath(_) => None,
        }
    }
}

impl From<SlotError> for ConfigError {
    fn from(value: SlotError) -> Self {
        Self::Storage(value)
    }
}

impl From<LoadError> for ConfigError {
    fn from(value: LoadError) -> Self {
        Self::Load(value)
    }
}

impl StorageConfig {
    /// Configuration for a SQLite file at `path`.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::Sqlite { path: path.into() },
            ..Self::default()
        }
    }

    /// Configuration for JSON slot files under `dir`.
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: StorageBackend::File { dir: dir.into() },
            ..Self::default()
        }
    }

    /// Replaces the slot key.
    pub fn with_slot_key(mut self, slot_key: impl Into<String>) -> Self {
        self.slot_key = slot_key.into();
        self
    }

    /// Checks the configuration without touching storage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if validate_slot_key(&self.slot_key).is_err() {
            return Err(ConfigError::InvalidSlotKey(self.slot_key.clone()));
        }
        match &self.backend {
            StorageBackend::Sqlite { path } => ensure_absolute(path),
            StorageBackend::File { dir } => ensure_absolute(dir),
            StorageBackend::SqliteInMemory | StorageBackend::Memory => Ok(()),
        }
    }

    /// Opens the configured backend.
    pub fn open_store(&self) -> Result<ConfiguredStore, ConfigError> {
        self.validate()?;
        let store = match &self.backend {
            StorageBackend::Sqlite { path } => {
                ConfiguredStore::sqlite(open_db(path).map_err(SlotError::from)?)?
            }
            StorageBackend::SqliteInMemory => {
                ConfiguredStore::sqlite(open_db_in_memory().map_err(SlotError::from)?)?
            }
            StorageBackend::File { dir } => ConfiguredStore::File(FileSlotStore::open(dir)?),
            StorageBackend::Memory => ConfiguredStore::Memory(MemorySlotStore::new()),
        };
        Ok(store)
    }

    /// Opens the backend and hydrates a task store from the configured slot.
    pub fn open_task_store(&self) -> Result<TaskStore<ConfiguredStore>, ConfigError> {
        let store = self.open_store()?;
        let bridge = PersistenceBridge::with_slot_key(store, self.slot_key.as_str());
        let task_store = TaskStore::open(bridge)?;
        info!(
            "event=storage_open module=config status=ok backend={} slot={}",
            self.backend.label(),
            self.slot_key
        );
        Ok(task_store)
    }
}

fn ensure_absolute(path: &Path) -> Result<(), ConfigError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(ConfigError::RelativePath(path.to_path_buf()))
    }
}

/// Slot store owning whichever backend was configured.
pub enum ConfiguredStore {
    Sqlite(Connection),
    File(FileSlotStore),
    Memory(MemorySlotStore),
}

impl ConfiguredStore {
    fn sqlite(conn: Connection) -> SlotResult<Self> {
        SqliteSlotStore::check_ready(&conn)?;
        Ok(Self::Sqlite(conn))
    }
}

impl SlotStore for ConfiguredStore {
    fn read_slot(&self, key: &str) -> SlotResult<Option<String>> {
        match self {
            Self::Sqlite(conn) => SqliteSlotStore::assume_ready(conn).read_slot(key),
            Self::File(store) => store.read_slot(key),
            Self::Memory(store) => store.read_slot(key),
        }
    }

    fn write_slot(&self, key: &str, value: &str) -> SlotResult<()> {
        match self {
            Self::Sqlite(conn) => SqliteSlotStore::assume_ready(conn).write_slot(key, value),
            Self::File(store) => store.write_slot(key, value),
            Self::Memory(store) => store.write_slot(key, value),
        }
    }
}
