//! Authentication error types.

use thiserror::Error;

use crate::api::ApiError;
use crate::forms::ValidationErrors;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The form failed validation; nothing was sent.
    #[error("invalid form: {0}")]
    Validation(#[from] ValidationErrors),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The API refused to create the account.
    #[error("sign up rejected: {0}")]
    SignupRejected(String),

    /// The API could not be reached or answered unexpectedly.
    #[error("auth API error: {0}")]
    Api(#[from] ApiError),
}
