//! Account credential types.
//!
//! Type-safe wrappers for the username and password accepted at sign-up.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Usernames are restricted to ASCII letters, digits and underscores.
static USERNAME_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").ok());

/// Errors that can occur when parsing a [`Username`] or [`Password`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    /// The input is empty or only whitespace.
    #[error("{field} is required")]
    Required {
        /// Human-readable field name.
        field: &'static str,
    },
    /// The username contains characters outside `[A-Za-z0-9_]`.
    #[error("Username can only contain letters, numbers, or underscores")]
    InvalidUsername,
    /// The password does not meet the strength rules.
    #[error(
        "Password must be {min}+ characters with uppercase, lowercase, number, and special character"
    )]
    WeakPassword {
        /// Minimum password length.
        min: usize,
    },
}

/// A sign-up username.
///
/// ## Examples
///
/// ```
/// use dummymart_core::Username;
///
/// assert!(Username::parse("emily_j").is_ok());
/// assert!(Username::parse("emily j").is_err());
/// assert!(Username::parse("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Parse a `Username` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Required`] for blank input and
    /// [`CredentialError::InvalidUsername`] for disallowed characters.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        if s.trim().is_empty() {
            return Err(CredentialError::Required { field: "Username" });
        }

        let valid = USERNAME_PATTERN
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(s));
        if !valid {
            return Err(CredentialError::InvalidUsername);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the username as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sign-up password that passed the strength rules.
///
/// `Debug` is redacted so passwords never reach logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Minimum password length.
    pub const MIN_LENGTH: usize = 8;

    /// Parse a `Password`, enforcing length and character-class rules.
    ///
    /// A strong password has at least [`Self::MIN_LENGTH`] characters and
    /// contains a lowercase letter, an uppercase letter, a digit and a
    /// character that is neither a letter nor a digit.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Required`] for blank input and
    /// [`CredentialError::WeakPassword`] otherwise.
    pub fn parse(s: &str) -> Result<Self, CredentialError> {
        if s.trim().is_empty() {
            return Err(CredentialError::Required { field: "Password" });
        }

        let long_enough = s.chars().count() >= Self::MIN_LENGTH;
        let has_lower = s.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = s.chars().any(|c| c.is_ascii_uppercase());
        let has_digit = s.chars().any(|c| c.is_ascii_digit());
        let has_special = s.chars().any(|c| !c.is_ascii_alphanumeric());

        if !(long_enough && has_lower && has_upper && has_digit && has_special) {
            return Err(CredentialError::WeakPassword {
                min: Self::MIN_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the raw password for transmission.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}
