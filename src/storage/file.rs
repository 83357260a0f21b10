//! JSON file storage backend.
//!
//! The whole map is rewritten on every change. Writes go to a temporary
//! file in the same directory which then replaces the target, so a crash
//! never leaves a half-written file behind.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};

use super::Storage;

// ============================================================================
// FileStorage
// ============================================================================

/// [`Storage`] persisted as a JSON object in one file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<FxHashMap<String, String>>,
}

impl FileStorage {
    /// Opens `path`, loading its contents if it exists.
    ///
    /// The parent directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but is not a JSON
    /// object of strings, or the directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| {
                Error::storage(format!(
                    "Failed to create storage directory at {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let values = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => FxHashMap::default(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                Error::storage(format!("Corrupt storage file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => FxHashMap::default(),
            Err(e) => return Err(Error::Io(e)),
        };

        debug!(path = %path.display(), keys = values.len(), "Opened file storage");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &FxHashMap<String, String>) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, values)?;
        file.write_all(b"\n")?;
        file.persist(&self.path).map_err(|e| {
            Error::storage(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e.error
            ))
        })?;

        debug!(path = %self.path.display(), keys = values.len(), "Wrote file storage");
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock();
        if values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        // Memory only changes once the file does
        let mut staged = values.clone();
        staged.insert(key.to_string(), value.to_string());
        self.flush(&staged)?;
        *values = staged;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock();
        if !values.contains_key(key) {
            return Ok(());
        }

        let mut staged = values.clone();
        staged.remove(key);
        self.flush(&staged)?;
        *values = staged;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
