//! File-backed state store
//!
//! One file per key under the state directory, so a front end on the same
//! host can read and write them with nothing but the filesystem. Writes go
//! to a temporary file and are renamed into place, so readers never see a
//! half-written value. Hash values (`history`) are a directory with one
//! append-only file per field.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;
use piwarmer_core::traits::{KeyValueStore, StoreError};

use crate::error::DaemonError;

/// Key-value store in a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, DaemonError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| DaemonError::Directory {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        check_name(key)?;
        Ok(self.root.join(key))
    }
}

/// Keys and fields become file names; refuse anything that could escape
fn check_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\', '\0']) {
        debug!("rejected store name {name:?}");
        return Err(StoreError::Io);
    }
    Ok(())
}

fn io_error(path: &Path, e: io::Error) -> StoreError {
    debug!("{}: {e}", path.display());
    StoreError::Io
}

impl KeyValueStore for FileStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, value).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| io_error(&path, e))
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        let result = if path.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&path, e)),
        }
    }

    fn append_field(&mut self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let dir = self.key_path(key)?;
        check_name(field)?;
        fs::create_dir_all(&dir).map_err(|e| io_error(&dir, e))?;

        let path = dir.join(field);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;
        file.write_all(value.as_bytes())
            .map_err(|e| io_error(&path, e))
    }
}
