//! File-backed slot store.
//!
//! # Responsibility
//! - Persist each slot as `<dir>/<key>.json`.
//!
//! # Invariants
//! - Writes go through a temporary sibling file and an atomic rename, so a
//!   reader sees either the previous value or the new one.

use crate::repo::slot_repo::{validate_slot_key, SlotResult, SlotStore};
use log::warn;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const SLOT_FILE_EXTENSION: &str = "json";

/// Slot store rooted at one directory.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    /// Creates the store, creating `dir` when missing.
    pub fn open(dir: impl AsRef<Path>) -> SlotResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SLOT_FILE_EXTENSION}"))
    }
}

impl SlotStore for FileSlotStore {
    fn read_slot(&self, key: &str) -> SlotResult<Option<String>> {
        validate_slot_key(key)?;
        match fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_slot(&self, key: &str, value: &str) -> SlotResult<()> {
        validate_slot_key(key)?;
        let target = self.slot_path(key);
        let staging = self
            .dir
            .join(format!(".{key}.{SLOT_FILE_EXTENSION}.tmp"));

        let written = write_and_sync(&staging, value).and_then(|()| fs::rename(&staging, &target));
        if let Err(err) = written {
            if let Err(cleanup_err) = fs::remove_file(&staging) {
                if cleanup_err.kind() != ErrorKind::NotFound {
                    warn!(
                        "event=slot_write module=repo status=warn backend=file error_code=staging_cleanup_failed error={cleanup_err}"
                    );
                }
            }
            return Err(err.into());
        }
        Ok(())
    }
}

fn write_and_sync(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}
