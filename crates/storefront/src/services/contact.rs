//! Contact relay client.
//!
//! The relay is a small companion service that forwards contact-form
//! messages to the shop's inbox. It answers `{"success": bool}` with an
//! optional message.

use std::time::Duration;

use serde::Deserialize;
use tracing::instrument;
use url::Url;

use crate::api::ApiError;
use crate::forms::ContactMessage;

/// Relay response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Client for `POST {base}/contact`.
#[derive(Clone)]
pub struct ContactClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ContactClient {
    /// Create a client for the relay at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid or the HTTP client fails
    /// to build.
    pub fn new(base_url: &Url) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            endpoint: base_url.join("contact")?,
        })
    }

    /// Post a validated message.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for a non-success status, or another
    /// error if the request fails or the body is not a relay response.
    #[instrument(skip(self, message), fields(email = %message.email))]
    pub async fn send(&self, message: &ContactMessage) -> Result<ContactResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(message)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, "contact relay returned non-success status");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: body.chars().take(200).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
