//! Session-related types.
//!
//! The logged-in user is persisted under two storage keys: the access token
//! under [`keys::TOKEN`] and a JSON user record under [`keys::USER`]. Both are
//! written together and removed together.

use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use dummymart_core::{Email, UserId};

use crate::api::LoginResponse;
use crate::storage::{LocalStorage, StorageError, encode_json, keys};

/// Lifetime requested for access tokens, in minutes.
pub const SESSION_TTL_MINS: u32 = 30;

/// The logged-in user.
#[derive(Clone)]
pub struct Session {
    pub user_id: UserId,
    pub username: String,
    pub email: Option<Email>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    access_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// The JSON record stored under [`keys::USER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredUser {
    id: UserId,
    username: String,
    #[serde(default)]
    email: Option<Email>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from a successful login at `now`.
    #[must_use]
    pub fn from_login(response: LoginResponse, now: DateTime<Utc>) -> Self {
        Self {
            user_id: response.id,
            username: response.username,
            email: response.email,
            first_name: response.first_name,
            last_name: response.last_name,
            access_token: SecretString::from(response.access_token),
            expires_at: now + Duration::minutes(i64::from(SESSION_TTL_MINS)),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// First name if known, otherwise the username.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.first_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }

    /// Write the token and user record in one storage write.
    ///
    /// # Errors
    ///
    /// Returns the storage write error. Storage is unchanged in that case.
    pub fn persist(&self, storage: &mut LocalStorage) -> Result<(), StorageError> {
        let record = StoredUser {
            id: self.user_id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            expires_at: self.expires_at,
        };
        let user = encode_json(keys::USER, &record)?;
        storage.set_many([
            (keys::USER, user),
            (keys::TOKEN, self.access_token.expose_secret().to_owned()),
        ])
    }

    /// Read a persisted session.
    ///
    /// Returns `None` unless both keys are present. A session that expired
    /// before `now`, or whose user record no longer decodes, is removed from
    /// storage and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns the storage error if removing a stale session fails.
    pub fn restore(
        storage: &mut LocalStorage,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, StorageError> {
        let Some(token) = storage.get(keys::TOKEN).map(str::to_owned) else {
            return Ok(None);
        };

        let record = match storage.get_json::<StoredUser>(keys::USER) {
            Ok(Some(record)) => record,
            Ok(None) => return Ok(None),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored session");
                Self::forget(storage)?;
                return Ok(None);
            }
        };

        let session = Self {
            user_id: record.id,
            username: record.username,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            access_token: SecretString::from(token),
            expires_at: record.expires_at,
        };

        if session.is_expired(now) {
            tracing::info!(user_id = %session.user_id, "stored session expired");
            Self::forget(storage)?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Remove the persisted session.
    ///
    /// # Errors
    ///
    /// Returns the storage write error.
    pub fn forget(storage: &mut LocalStorage) -> Result<(), StorageError> {
        storage.remove(&[keys::TOKEN, keys::USER])
    }
}
