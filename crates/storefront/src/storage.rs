//! Durable local key-value storage.
//!
//! The storefront persists three values between runs: the access token, the
//! logged-in user record and the theme preference. They live in one small JSON
//! object on disk, rewritten whole on every change (write to a sibling temp
//! file, then rename).
//!
//! ```json
//! { "theme": "dark", "token": "eyJ...", "user": "{\"id\":1,...}" }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Fixed storage keys.
pub mod keys {
    /// Access token of the logged-in user.
    pub const TOKEN: &str = "token";

    /// JSON record of the logged-in user.
    pub const USER: &str = "user";

    /// Theme preference (`light` or `dark`).
    pub const THEME: &str = "theme";
}

/// Errors from the local storage file.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the file failed.
    #[error("storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not a JSON object of strings.
    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A value could not be encoded or decoded.
    #[error("storage value for '{key}' is invalid: {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A string-to-string map persisted to a JSON file.
///
/// Without a path the storage is memory-only, which is what tests and a
/// storage-less run use.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl LocalStorage {
    /// Open the storage file, starting empty if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be read and
    /// [`StorageError::Corrupt`] if it is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
                    path: path.clone(),
                    source,
                })?
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "local storage opened");

        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// A storage that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Backing file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Decode a JSON-encoded value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Value`] if the stored value is not valid JSON
    /// for `T`.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.get(key)
            .map(|raw| {
                serde_json::from_str(raw).map_err(|source| StorageError::Value {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Store a value and persist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be written; the
    /// in-memory map is left unchanged in that case.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.into());
        self.commit(next)
    }

    /// Store a JSON-encoded value and persist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Value`] if encoding fails, or the errors of
    /// [`Self::set`].
    pub fn set_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let encoded = encode_json(key, value)?;
        self.set(key, encoded)
    }

    /// Store several values and persist them in a single write. Either every
    /// value lands or none does.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be written; the
    /// in-memory map is left unchanged in that case.
    pub fn set_many<'a>(
        &mut self,
        values: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Result<(), StorageError> {
        let mut next = self.entries.clone();
        next.extend(
            values
                .into_iter()
                .map(|(key, value)| (key.to_string(), value)),
        );
        self.commit(next)
    }

    /// Remove keys and persist once.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the file cannot be written.
    pub fn remove(&mut self, keys: &[&str]) -> Result<(), StorageError> {
        if !keys.iter().any(|key| self.entries.contains_key(*key)) {
            return Ok(());
        }

        let mut next = self.entries.clone();
        for key in keys {
            next.remove(*key);
        }
        self.commit(next)
    }

    fn commit(&mut self, next: BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(path) = &self.path {
            write_atomically(path, &next)?;
        }
        self.entries = next;
        Ok(())
    }
}

/// Encode `value` as JSON for storage under `key`.
///
/// # Errors
///
/// Returns [`StorageError::Value`] if serialization fails.
pub fn encode_json<T: Serialize>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Value {
        key: key.to_string(),
        source,
    })
}

fn write_atomically(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
    let io_error = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    let contents = serde_json::to_string_pretty(entries).map_err(|source| StorageError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(io_error)?;
    fs::rename(&tmp, path).map_err(io_error)?;
    Ok(())
}
