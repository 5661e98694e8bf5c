//! Slot store contract with SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Provide `read_slot`/`write_slot` over named string values.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - Slot keys are validated before any storage access.
//! - `SqliteSlotStore` only accepts fully migrated connections.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MAX_SLOT_KEY_CHARS: usize = 64;
const SLOT_TABLE: &str = "kv_slots";

pub type SlotResult<T> = Result<T, SlotError>;

/// Errors from slot storage operations.
#[derive(Debug)]
pub enum SlotError {
    /// Slot key does not satisfy the key rule.
    InvalidKey(String),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// File system error.
    Io(std::io::Error),
    /// Write would exceed the configured byte quota.
    QuotaExceeded {
        key: String,
        requested_bytes: usize,
        quota_bytes: usize,
    },
    /// Store refused access.
    Unavailable(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table or column is missing.
    MissingSchema(&'static str),
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(
                f,
                "invalid slot key `{key}`; expected 1-{MAX_SLOT_KEY_CHARS} chars of [A-Za-z0-9_.-] not starting with `.`"
            ),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                key,
                requested_bytes,
                quota_bytes,
            } => write!(
                f,
                "slot `{key}` write of {requested_bytes} bytes exceeds quota of {quota_bytes} bytes"
            ),
            Self::Unavailable(reason) => write!(f, "slot store unavailable: {reason}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "slot store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingSchema(item) => write!(f, "slot store requires `{item}`"),
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for SlotError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SlotError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for SlotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Synchronous key-value store of string slots.
pub trait SlotStore {
    /// Returns the slot value, or `None` when the slot was never written.
    fn read_slot(&self, key: &str) -> SlotResult<Option<String>>;
    /// Replaces the slot value.
    fn write_slot(&self, key: &str, value: &str) -> SlotResult<()>;
}

impl<S: SlotStore + ?Sized> SlotStore for &S {
    fn read_slot(&self, key: &str) -> SlotResult<Option<String>> {
        (**self).read_slot(key)
    }

    fn write_slot(&self, key: &str, value: &str) -> SlotResult<()> {
        (**self).write_slot(key, value)
    }
}

/// Checks a slot key against the key rule.
pub fn validate_slot_key(key: &str) -> SlotResult<()> {
    let valid = !key.is_empty()
        && key.chars().count() <= MAX_SLOT_KEY_CHARS
        && !key.starts_with('.')
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(SlotError::InvalidKey(key.to_string()))
    }
}

/// SQLite-backed slot store.
pub struct SqliteSlotStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSlotStore<'conn> {
    /// Creates a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> SlotResult<Self> {
        ensure_slot_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection already verified with `check_ready`.
    pub(crate) fn assume_ready(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Verifies `conn` without keeping a store around.
    pub(crate) fn check_ready(conn: &Connection) -> SlotResult<()> {
        ensure_slot_connection_ready(conn)
    }
}

impl SlotStore for SqliteSlotStore<'_> {
    fn read_slot(&self, key: &str) -> SlotResult<Option<String>> {
        validate_slot_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT slot_value FROM kv_slots WHERE slot_key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write_slot(&self, key: &str, value: &str) -> SlotResult<()> {
        validate_slot_key(key)?;
        self.conn.execute(
            "INSERT INTO kv_slots (slot_key, slot_value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(slot_key) DO UPDATE SET
                slot_value = excluded.slot_value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

fn ensure_slot_connection_ready(conn: &Connection) -> SlotResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(SlotError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({SLOT_TABLE});"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    if columns.is_empty() {
        return Err(SlotError::MissingSchema(SLOT_TABLE));
    }
    for column in ["slot_key", "slot_value", "updated_at"] {
        if !columns.iter().any(|current| current == column) {
            return Err(SlotError::MissingSchema(column));
        }
    }

    Ok(())
}

/// In-memory slot store for tests and embedding.
///
/// Supports a byte quota and an availability switch to simulate a store that
/// rejects writes.
#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: RefCell<HashMap<String, String>>,
    quota_bytes: Option<usize>,
    unavailable: Cell<bool>,
    writes: Cell<usize>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store rejecting slot values longer than `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::default()
        }
    }

    /// Seeds a slot without counting it as a write.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<String>) {
        self.slots.borrow_mut().insert(key.into(), value.into());
    }

    /// Makes every following read and write fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Returns the raw slot value without key validation.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.slots.borrow().get(key).cloned()
    }

    fn ensure_available(&self) -> SlotResult<()> {
        if self.unavailable.get() {
            return Err(SlotError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl SlotStore for MemorySlotStore {
    fn read_slot(&self, key: &str) -> SlotResult<Option<String>> {
        validate_slot_key(key)?;
        self.ensure_available()?;
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write_slot(&self, key: &str, value: &str) -> SlotResult<()> {
        validate_slot_key(key)?;
        self.ensure_available()?;
        if let Some(quota_bytes) = self.quota_bytes {
            if value.len() > quota_bytes {
                return Err(SlotError::QuotaExceeded {
                    key: key.to_string(),
                    requested_bytes: value.len(),
                    quota_bytes,
                });
            }
        }
        self.slots
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
