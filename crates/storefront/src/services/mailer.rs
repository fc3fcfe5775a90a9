//! EmailJS client for transactional email.
//!
//! EmailJS renders a stored template with the parameters we send and
//! delivers it. The public key identifies the account and travels in the
//! request body as `user_id`.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::EmailJsConfig;

/// EmailJS send endpoint.
const SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Errors that can occur when sending through EmailJS.
#[derive(Debug, Error)]
pub enum MailError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The endpoint URL is invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Template parameters for the abandoned-cart email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartTemplateParams {
    pub product_name: String,
    pub product_qty: String,
    pub product_price: String,
    pub to_email: String,
}

#[derive(Serialize)]
struct SendRequest<'a, P> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a P,
}

/// EmailJS REST client.
#[derive(Clone)]
pub struct EmailJsClient {
    client: reqwest::Client,
    config: EmailJsConfig,
    endpoint: Url,
}

impl EmailJsClient {
    /// Create a client for the public EmailJS endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &EmailJsConfig) -> Result<Self, MailError> {
        Self::with_endpoint(config, Url::parse(SEND_URL)?)
    }

    /// Create a client posting to `endpoint` instead.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn with_endpoint(config: &EmailJsConfig, endpoint: Url) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            endpoint,
        })
    }

    /// Render and send the configured template.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or EmailJS answers with a
    /// non-success status.
    pub async fn send<P: Serialize + Sync>(&self, params: &P) -> Result<(), MailError> {
        let body = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: self.config.public_key.expose_secret(),
            template_params: params,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}
