//! Light/dark theme preference.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::storage::{LocalStorage, StorageError, keys};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme '{0}' (expected light or dark)")]
pub struct UnknownTheme(pub String);

impl Theme {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    /// Stored preference, or the default if none is stored. An unreadable
    /// value falls back to the default as well.
    #[must_use]
    pub fn load(storage: &LocalStorage) -> Self {
        storage
            .get(keys::THEME)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    /// Persist this theme.
    ///
    /// # Errors
    ///
    /// Returns the storage write error.
    pub fn save(self, storage: &mut LocalStorage) -> Result<(), StorageError> {
        storage.set(keys::THEME, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}
