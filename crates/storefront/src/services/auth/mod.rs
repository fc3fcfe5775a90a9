//! Authentication service.
//!
//! Credential login and account creation against the DummyJSON auth
//! endpoints. The remote API owns the user records; nothing is stored here
//! except the resulting [`Session`].

mod error;

pub use error::AuthError;

use chrono::Utc;
use tracing::instrument;

use crate::api::{CreatedUser, DummyJsonClient, LoginRequest, NewUser};
use crate::forms::{LoginForm, SignupForm};
use crate::models::session::{SESSION_TTL_MINS, Session};

/// Authentication service.
pub struct AuthService<'a> {
    api: &'a DummyJsonClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: &'a DummyJsonClient) -> Self {
        Self { api }
    }

    /// Login with username and password.
    ///
    /// The username is trimmed; the password is sent as typed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for blank fields,
    /// `AuthError::InvalidCredentials` if the API rejects the credentials,
    /// and `AuthError::Api` for any other failure.
    #[instrument(skip(self, form), fields(username = %form.username.trim()))]
    pub async fn login(&self, form: &LoginForm) -> Result<Session, AuthError> {
        form.validate()?;

        let request = LoginRequest {
            username: form.username.trim(),
            password: &form.password,
            expires_in_mins: SESSION_TTL_MINS,
        };

        let response = self.api.login(&request).await.map_err(|e| {
            if e.is_rejection() {
                AuthError::InvalidCredentials
            } else {
                AuthError::Api(e)
            }
        })?;

        Ok(Session::from_login(response, Utc::now()))
    }

    /// Register a new account.
    ///
    /// The username doubles as the account's first name. The new user is not
    /// logged in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if any field is invalid,
    /// `AuthError::SignupRejected` if the API refuses the record, and
    /// `AuthError::Api` for any other failure.
    #[instrument(skip(self, form), fields(username = %form.username.trim()))]
    pub async fn signup(&self, form: &SignupForm) -> Result<CreatedUser, AuthError> {
        let valid = form.validate()?;

        let user = NewUser {
            first_name: valid.username.as_str(),
            email: valid.email.as_str(),
            password: valid.password.expose(),
        };

        self.api.add_user(&user).await.map_err(|e| match e {
            crate::api::ApiError::Status {
                status: 400..=499,
                message,
            } => AuthError::SignupRejected(message),
            other => AuthError::Api(other),
        })
    }
}
