//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `DUMMYMART_API_URL` - DummyJSON base URL (default: <https://dummyjson.com>)
//! - `DUMMYMART_CONTACT_URL` - Contact relay base URL (default: <http://localhost:5000>)
//! - `DUMMYMART_STORAGE_PATH` - Local storage file (default: `.dummymart/storage.json`)
//! - `DUMMYMART_PAGE_SIZE` - Products per page (default: 20)
//! - `DUMMYMART_SCROLL_THRESHOLD` - Scroll distance that triggers a fetch (default: 300)
//! - `DUMMYMART_CART_NOTIFY_DELAY_SECS` - Abandoned-cart debounce delay (default: 30)
//! - `DUMMYMART_NOTIFY_FALLBACK_EMAIL` - Recipient when the session has no email
//! - `EMAILJS_SERVICE_ID`, `EMAILJS_TEMPLATE_ID`, `EMAILJS_PUBLIC_KEY` - EmailJS
//!   credentials; set all three or none (notifications are only logged without them)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use dummymart_core::Email;

use crate::catalog::{DEFAULT_PAGE_SIZE, DEFAULT_SCROLL_THRESHOLD};

const DEFAULT_API_URL: &str = "https://dummyjson.com";
const DEFAULT_CONTACT_URL: &str = "http://localhost:5000";
const DEFAULT_STORAGE_PATH: &str = ".dummymart/storage.json";
const DEFAULT_CART_NOTIFY_DELAY_SECS: u64 = 30;

const EMAILJS_VARS: [&str; 3] = [
    "EMAILJS_SERVICE_ID",
    "EMAILJS_TEMPLATE_ID",
    "EMAILJS_PUBLIC_KEY",
];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// DummyJSON API configuration
    pub api: ApiConfig,
    /// Contact relay base URL
    pub contact_url: Url,
    /// Local key-value storage file
    pub storage_path: PathBuf,
    /// Products requested per page
    pub page_size: u32,
    /// Distance from the bottom that triggers the next page
    pub scroll_threshold: u32,
    /// Quiet period before an abandoned-cart notification is sent
    pub cart_notify_delay: Duration,
    /// Abandoned-cart notification settings
    pub notify: NotifyConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// DummyJSON API configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/` so relative paths join beneath it
    pub base_url: Url,
}

/// Abandoned-cart notification configuration.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    /// EmailJS credentials; `None` logs notifications instead of sending them
    pub emailjs: Option<EmailJsConfig>,
    /// Recipient used when the logged-in user has no email address
    pub fallback_email: Option<Email>,
}

/// EmailJS credentials.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct EmailJsConfig {
    /// EmailJS service ID
    pub service_id: String,
    /// EmailJS template ID
    pub template_id: String,
    /// EmailJS public key (sent as `user_id`)
    pub public_key: SecretString,
}

impl std::fmt::Debug for EmailJsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsConfig")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &"[REDACTED]")
            .finish()
    }
}

impl StorefrontConfig {
    /// Configuration for the given endpoints with every other setting at its
    /// default. Both URLs get a trailing `/` like [`parse_base_url`] gives.
    #[must_use]
    pub fn new(api_url: Url, contact_url: Url) -> Self {
        Self {
            api: ApiConfig {
                base_url: with_trailing_slash(api_url),
            },
            contact_url: with_trailing_slash(contact_url),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            scroll_threshold: DEFAULT_SCROLL_THRESHOLD,
            cart_notify_delay: Duration::from_secs(DEFAULT_CART_NOTIFY_DELAY_SECS),
            notify: NotifyConfig::default(),
            sentry_dsn: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, if only some EmailJS
    /// variables are set, or if the EmailJS key looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api = ApiConfig {
            base_url: get_url("DUMMYMART_API_URL", DEFAULT_API_URL)?,
        };
        let contact_url = get_url("DUMMYMART_CONTACT_URL", DEFAULT_CONTACT_URL)?;
        let storage_path =
            PathBuf::from(get_env_or_default("DUMMYMART_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let page_size = get_positive_u32("DUMMYMART_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        let scroll_threshold = get_env_or_default(
            "DUMMYMART_SCROLL_THRESHOLD",
            &DEFAULT_SCROLL_THRESHOLD.to_string(),
        )
        .parse::<u32>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("DUMMYMART_SCROLL_THRESHOLD".to_string(), e.to_string())
        })?;
        let delay_secs = get_env_or_default(
            "DUMMYMART_CART_NOTIFY_DELAY_SECS",
            &DEFAULT_CART_NOTIFY_DELAY_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar(
                "DUMMYMART_CART_NOTIFY_DELAY_SECS".to_string(),
                e.to_string(),
            )
        })?;

        let notify = NotifyConfig {
            emailjs: EmailJsConfig::from_env()?,
            fallback_email: get_optional_env("DUMMYMART_NOTIFY_FALLBACK_EMAIL")
                .map(|raw| {
                    Email::parse(&raw).map_err(|e| {
                        ConfigError::InvalidEnvVar(
                            "DUMMYMART_NOTIFY_FALLBACK_EMAIL".to_string(),
                            e.to_string(),
                        )
                    })
                })
                .transpose()?,
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            api,
            contact_url,
            storage_path,
            page_size,
            scroll_threshold,
            cart_notify_delay: Duration::from_secs(delay_secs),
            notify,
            sentry_dsn,
        })
    }
}

impl EmailJsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let present: Vec<&str> = EMAILJS_VARS
            .iter()
            .copied()
            .filter(|key| get_optional_env(key).is_some())
            .collect();

        if present.is_empty() {
            return Ok(None);
        }

        if let Some(missing) = EMAILJS_VARS.iter().find(|key| !present.contains(key)) {
            return Err(ConfigError::MissingEnvVar(format!(
                "{missing} (EmailJS variables must be set together)"
            )));
        }

        Ok(Some(Self {
            service_id: get_required_env("EMAILJS_SERVICE_ID")?,
            template_id: get_required_env("EMAILJS_TEMPLATE_ID")?,
            public_key: get_validated_secret("EMAILJS_PUBLIC_KEY")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable. Blank values count as missing.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    get_optional_env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Blank values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn get_positive_u32(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = get_env_or_default(key, &default.to_string())
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

fn get_url(key: &str, default: &str) -> Result<Url, ConfigError> {
    parse_base_url(&get_env_or_default(key, default))
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

/// Parse an http(s) base URL, appending a trailing `/` to the path so that
/// relative endpoints join beneath it.
///
/// # Errors
///
/// Returns a description of the problem if `raw` is not an http(s) URL.
pub fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(with_trailing_slash(url))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Validate that a secret is not a placeholder.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
