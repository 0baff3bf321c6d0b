//! HTTP client for the remote document store.
//!
//! Wraps the document service endpoints (document fetch, document save,
//! blob save) using [`reqwest`].

use std::time::Duration;

use reqwest::StatusCode;
use storybook_core::document::StoryDocument;
use storybook_core::protocol::{
    SaveBlobRequest, SaveResponse, DOCUMENT_PATH, SAVE_BLOB_PATH, SAVE_DOCUMENT_PATH,
};
use storybook_core::validation::document_from_value;

use crate::error::GatewayError;

/// HTTP client for a single document service.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRemote {
    /// Create a client for the service at `base_url`, e.g. `http://host:3000`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client whose requests give up after `timeout`.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the saved document.
    ///
    /// `404` means the service has no document yet and yields `Ok(None)`.
    pub async fn load(&self) -> Result<Option<StoryDocument>, GatewayError> {
        let response = self.client.get(self.url(DOCUMENT_PATH)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = Self::ensure_success(response).await?;
        let value: serde_json::Value = response.json().await?;
        Ok(Some(document_from_value(value)?))
    }

    /// Overwrite the remote document. Sends `POST /api/save-scenes`.
    pub async fn save(&self, document: &StoryDocument) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url(SAVE_DOCUMENT_PATH))
            .json(document)
            .send()
            .await?;

        Self::parse_save_response(response).await?;
        Ok(())
    }

    /// Store `content` as a blob named `filename`, returning its served path.
    /// Sends `POST /api/save-image`.
    pub async fn save_blob(&self, content: &str, filename: &str) -> Result<String, GatewayError> {
        let body = SaveBlobRequest {
            filename: filename.to_string(),
            base64_data: content.to_string(),
        };

        let response = self
            .client
            .post(self.url(SAVE_BLOB_PATH))
            .json(&body)
            .send()
            .await?;

        Self::parse_save_response(response)
            .await?
            .path
            .ok_or_else(|| GatewayError::Rejected("response is missing 'path'".to_string()))
    }

    // ---- private helpers ----

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ensure the response has a success status code, otherwise return a
    /// [`GatewayError::Status`] carrying the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a save endpoint response, treating `"success": false` as an
    /// error even on a 2xx status.
    async fn parse_save_response(
        response: reqwest::Response,
    ) -> Result<SaveResponse, GatewayError> {
        let response = Self::ensure_success(response).await?;
        let parsed: SaveResponse = response.json().await?;
        if !parsed.success {
            return Err(GatewayError::Rejected(
                parsed.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }
        Ok(parsed)
    }
}
