//! Persistence bridge between the task collection and one storage slot.
//!
//! # Responsibility
//! - Encode the full collection as a JSON array and write it to one slot.
//! - Decode the slot tolerantly on load, keeping every entry that has an id.
//!
//! # Invariants
//! - `save` always writes the whole collection; there is no partial write.
//! - `load` only fails as a whole when the payload is not a JSON array.
//! - Loaded ids are pairwise distinct.
//! - Task text never appears in log events.

use crate::model::task::Task;
use crate::model::task_id::TaskIdAllocator;
use crate::repo::slot_repo::{SlotError, SlotStore};
use log::{debug, error, warn};
use serde_json::Value;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Slot key used when none is configured.
pub const DEFAULT_SLOT_KEY: &str = "todos";

/// Write failure surfaced to the caller.
#[derive(Debug)]
pub enum PersistenceError {
    /// Collection could not be encoded.
    Encode(serde_json::Error),
    /// Store rejected the write.
    Store(SlotError),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode task collection: {err}"),
            Self::Store(err) => write!(f, "failed to persist task collection: {err}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<SlotError> for PersistenceError {
    fn from(value: SlotError) -> Self {
        Self::Store(value)
    }
}

/// Read failure from `PersistenceBridge::load`.
#[derive(Debug)]
pub enum LoadError {
    /// Slot holds a value that is not a JSON array.
    Deserialization(serde_json::Error),
    /// Store rejected the read.
    Store(SlotError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deserialization(err) => write!(f, "malformed persisted task collection: {err}"),
            Self::Store(err) => write!(f, "failed to read task collection: {err}"),
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Deserialization(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

impl From<SlotError> for LoadError {
    fn from(value: SlotError) -> Self {
        Self::Store(value)
    }
}

/// Result of tolerant decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DecodedCollection {
    pub tasks: Vec<Task>,
    /// Entries dropped because they carry no usable id.
    pub skipped: usize,
    /// Entries kept under a fresh id because an earlier entry used theirs.
    pub reassigned: usize,
}

/// Encodes a collection as the persisted JSON array.
pub fn encode_collection(tasks: &[Task]) -> Result<String, serde_json::Error> {
    serde_json::to_string(tasks)
}

/// Decodes a persisted JSON array field by field.
///
/// Unknown fields are ignored. A missing, `null`, or mistyped `text` becomes
/// empty, `completed` becomes `false`, and `createdAt` becomes the entry id.
/// Only non-object entries and entries without an integral `id` are skipped.
/// An entry repeating an earlier id keeps its place and fields under a fresh
/// id from an allocator seeded with the stored ids.
pub fn decode_collection(raw: &str) -> Result<DecodedCollection, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_str(raw)?;
    let mut seen = HashSet::with_capacity(entries.len());
    let mut duplicates = Vec::new();
    let mut decoded = DecodedCollection {
        tasks: Vec::with_capacity(entries.len()),
        ..DecodedCollection::default()
    };

    for entry in &entries {
        let Some(task) = decode_entry(entry) else {
            decoded.skipped += 1;
            continue;
        };
        if !seen.insert(task.id) {
            duplicates.push(decoded.tasks.len());
        }
        decoded.tasks.push(task);
    }

    if duplicates.is_empty() {
        return Ok(decoded);
    }

    let unique: Vec<Task> = decoded
        .tasks
        .iter()
        .enumerate()
        .filter(|(index, _)| !duplicates.contains(index))
        .map(|(_, task)| task.clone())
        .collect();
    let mut ids = TaskIdAllocator::seeded_from(&unique);
    let mut exhausted = Vec::new();
    for index in duplicates {
        match ids.next_id(decoded.tasks[index].id) {
            Some(id) => {
                decoded.tasks[index].id = id;
                decoded.reassigned += 1;
            }
            None => exhausted.push(index),
        }
    }
    for index in exhausted.into_iter().rev() {
        decoded.tasks.remove(index);
        decoded.skipped += 1;
    }

    Ok(decoded)
}

fn decode_entry(entry: &Value) -> Option<Task> {
    let fields = entry.as_object()?;
    let id = fields.get("id").and_then(integral)?;
    Some(Task {
        id,
        text: fields
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        completed: fields
            .get("completed")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        created_at: fields.get("createdAt").and_then(integral).unwrap_or(id),
    })
}

/// Reads a JSON number as `i64`, accepting floats with no fractional part.
fn integral(value: &Value) -> Option<i64> {
    if let Some(number) = value.as_i64() {
        return Some(number);
    }
    let float = value.as_f64()?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.fract() == 0.0 && in_range).then_some(float as i64)
}

/// Reads and writes one task collection slot.
pub struct PersistenceBridge<S: SlotStore> {
    store: S,
    slot_key: String,
}

impl<S: SlotStore> PersistenceBridge<S> {
    /// Creates a bridge over the default `todos` slot.
    pub fn new(store: S) -> Self {
        Self::with_slot_key(store, DEFAULT_SLOT_KEY)
    }

    /// Creates a bridge over a caller-chosen slot.
    pub fn with_slot_key(store: S, slot_key: impl Into<String>) -> Self {
        Self {
            store,
            slot_key: slot_key.into(),
        }
    }

    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads the collection.
    ///
    /// An absent or blank slot yields an empty collection.
    ///
    /// # Errors
    /// - `LoadError::Deserialization` when the payload is not a JSON array.
    /// - `LoadError::Store` when the store rejects the read.
    pub fn load(&self) -> Result<Vec<Task>, LoadError> {
        let Some(raw) = self.store.read_slot(&self.slot_key)? else {
            debug!(
                "event=tasks_load module=persistence status=ok slot={} outcome=absent",
                self.slot_key
            );
            return Ok(Vec::new());
        };
        if raw.trim().is_empty() {
            debug!(
                "event=tasks_load module=persistence status=ok slot={} outcome=blank",
                self.slot_key
            );
            return Ok(Vec::new());
        }

        let decoded = decode_collection(&raw).map_err(|err| {
            error!(
                "event=tasks_load module=persistence status=error slot={} error_code=deserialize_failed error={}",
                self.slot_key, err
            );
            LoadError::Deserialization(err)
        })?;

        if decoded.skipped > 0 || decoded.reassigned > 0 {
            warn!(
                "event=tasks_load module=persistence status=warn slot={} loaded={} skipped={} reassigned={}",
                self.slot_key,
                decoded.tasks.len(),
                decoded.skipped,
                decoded.reassigned
            );
        } else {
            debug!(
                "event=tasks_load module=persistence status=ok slot={} loaded={}",
                self.slot_key,
                decoded.tasks.len()
            );
        }
        Ok(decoded.tasks)
    }

    /// Replaces the slot with the full collection.
    ///
    /// # Errors
    /// - `PersistenceError::Store` when the store is unavailable, over quota,
    ///   or otherwise rejects the write.
    pub fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError> {
        let encoded = encode_collection(tasks).map_err(PersistenceError::Encode)?;
        if let Err(err) = self.store.write_slot(&self.slot_key, &encoded) {
            error!(
                "event=tasks_save module=persistence status=error slot={} count={} bytes={} error={}",
                self.slot_key,
                tasks.len(),
                encoded.len(),
                err
            );
            return Err(err.into());
        }
        debug!(
            "event=tasks_save module=persistence status=ok slot={} count={} bytes={}",
            self.slot_key,
            tasks.len(),
            encoded.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::decode_collection;

    #[test]
    fn decode_defaults_missing_fields_and_ignores_unknown_ones() {
        let decoded = decode_collection(r#"[{"id":3,"priority":"high"}]"#).unwrap();
        assert_eq!(decoded.skipped, 0);
        let task = &decoded.tasks[0];
        assert_eq!(task.id, 3);
        assert_eq!(task.text, "");
        assert!(!task.completed);
        assert_eq!(task.created_at, 3);
    }

    #[test]
    fn decode_skips_entries_without_usable_id() {
        let raw = r#"[
            {"id":1,"text":"a","completed":true,"createdAt":1},
            "not an object",
            {"text":"no id"},
            {"id":"1"},
            {"id":null},
            {"id":2.5},
            {"id":2.0,"text":"b","completed":false,"createdAt":2}
        ]"#;
        let decoded = decode_collection(raw).unwrap();
        let ids: Vec<i64> = decoded.tasks.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(decoded.tasks[0].text, "a");
        assert_eq!(decoded.skipped, 5);
        assert_eq!(decoded.reassigned, 0);
    }

    #[test]
    fn decode_defaults_null_and_mistyped_fields() {
        let raw = r#"[
            {"id":1,"text":null,"completed":true,"createdAt":10},
            {"id":2,"text":"keep","completed":null,"createdAt":"yesterday"},
            {"id":3,"text":7,"completed":"yes","createdAt":30}
        ]"#;
        let decoded = decode_collection(raw).unwrap();
        assert_eq!(decoded.skipped, 0);
        let tasks = &decoded.tasks;
        assert_eq!((tasks[0].text.as_str(), tasks[0].completed), ("", true));
        assert_eq!(tasks[0].created_at, 10);
        assert_eq!((tasks[1].text.as_str(), tasks[1].completed), ("keep", false));
        assert_eq!(tasks[1].created_at, 2);
        assert_eq!((tasks[2].text.as_str(), tasks[2].completed), ("", false));
    }

    #[test]
    fn decode_moves_repeated_id_above_every_stored_id() {
        let raw = r#"[
            {"id":5,"text":"a","createdAt":5},
            {"id":5,"text":"b","completed":true,"createdAt":6},
            {"id":9,"text":"c","createdAt":9}
        ]"#;
        let decoded = decode_collection(raw).unwrap();
        let ids: Vec<i64> = decoded.tasks.iter().map(|task| task.id).collect();
        assert_eq!(ids, vec![5, 10, 9]);
        assert_eq!(decoded.tasks[1].text, "b");
        assert!(decoded.tasks[1].completed);
        assert_eq!(decoded.tasks[1].created_at, 6);
        assert_eq!(decoded.reassigned, 1);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn decode_rejects_non_array_payload() {
        assert!(decode_collection("{\"id\":1}").is_err());
        assert!(decode_collection("null").is_err());
        assert!(decode_collection("not json").is_err());
    }
}
