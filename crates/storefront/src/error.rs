//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type returned by every [`Storefront`]
//! operation. Each variant maps to a short user-facing notice; internal
//! failures are captured to Sentry and their details stay out of the notice.
//!
//! [`Storefront`]: crate::state::Storefront

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::config::ConfigError;
use crate::forms::ValidationErrors;
use crate::services::auth::AuthError;
use crate::services::mailer::MailError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API unreachable or answered with a failure status.
    #[error("Network error: {0}")]
    Network(#[source] ApiError),

    /// Form input failed validation; nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The API rejected the username/password pair.
    #[error("Invalid credentials")]
    Auth,

    /// The API refused to create an account.
    #[error("Sign up rejected: {0}")]
    SignupRejected(String),

    /// A guest tried to change the cart.
    #[error("Login required")]
    LoginRequired,

    /// A cart change was refused.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The contact relay answered `success: false`.
    #[error("Contact message rejected")]
    ContactRejected(Option<String>),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound(what) => Self::NotFound(what),
            other => Self::Network(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(errors) => Self::Validation(errors),
            AuthError::InvalidCredentials => Self::Auth,
            AuthError::SignupRejected(message) => Self::SignupRejected(message),
            AuthError::Api(api) => api.into(),
        }
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl AppError {
    /// Whether this is a fault on our side or upstream rather than a user
    /// mistake.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Storage(_) | Self::Config(_) | Self::Internal(_)
        )
    }

    /// Message safe to show the user.
    #[must_use]
    pub fn notice(&self) -> String {
        match self {
            Self::Network(ApiError::RateLimited(secs)) => {
                format!("Too many requests. Please try again in {secs} seconds.")
            }
            Self::Network(_) => "Network error. Please try again.".to_string(),
            Self::Validation(errors) => errors.to_string(),
            Self::Auth => "Invalid username or password".to_string(),
            Self::SignupRejected(_) => "Sign up failed".to_string(),
            Self::LoginRequired => "Please login to add items to cart.".to_string(),
            Self::Cart(err) => err.to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::ContactRejected(_) => {
                "Something went wrong. Please try again later.".to_string()
            }
            Self::Storage(_) | Self::Config(_) | Self::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }

    /// Log the error and capture internal ones to Sentry.
    pub fn report(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::debug!(error = %self, "Operation rejected");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Set quantity", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::LoginForm;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
        assert_eq!(AppError::LoginRequired.to_string(), "Login required");
    }

    #[test]
    fn test_api_not_found_maps_to_not_found() {
        let err: AppError = ApiError::NotFound("Product not found: 9".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_auth_errors_map_to_generic_notice() {
        let err: AppError = AuthError::InvalidCredentials.into();
        assert_eq!(err.notice(), "Invalid username or password");

        let err: AppError = AuthError::Api(ApiError::Status {
            status: 502,
            message: "bad gateway".to_string(),
        })
        .into();
        assert!(err.is_internal());
        assert_eq!(err.notice(), "Network error. Please try again.");
    }

    #[test]
    fn test_notices_hide_internal_details() {
        let err = AppError::Internal("stack trace with secrets".to_string());
        assert!(!err.notice().contains("secrets"));

        let err = AppError::Network(ApiError::Status {
            status: 500,
            message: "db password leaked".to_string(),
        });
        assert!(!err.notice().contains("leaked"));
    }

    #[test]
    fn test_validation_notice_lists_fields() {
        let errors = LoginForm::default().validate().err();
        let err = AppError::Validation(errors.unwrap_or_default());
        assert_eq!(
            err.notice(),
            "Username is required; Password is required"
        );
    }
}
