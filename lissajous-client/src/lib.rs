//! Lissajous HTTP Client
//!
//! A typed async client for the Lissajous render service.
//!
//! # Example
//!
//! ```no_run
//! use lissajous_client::LissajousClient;
//! use lissajous_core::dto::job::RenderForm;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = LissajousClient::new("http://localhost:8000");
//!
//!     let submitted = client.submit(&RenderForm {
//!         frames: Some("30".to_string()),
//!         ..Default::default()
//!     }).await?;
//!
//!     println!("Started job: {}", submitted.job_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Lissajous render service
#[derive(Debug, Clone)]
pub struct LissajousClient {
    /// Base URL of the service (e.g., "http://localhost:8000")
    base_url: String,
    client: Client,
}

impl LissajousClient {
    /// Create a new client
    ///
    /// # Example
    /// ```
    /// use lissajous_client::LissajousClient;
    ///
    /// let client = LissajousClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the service
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code, turning failures into [`ClientError::ApiError`]
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(
                status.as_u16(),
                error::extract_message(&error_text),
            ));
        }

        Ok(response)
    }

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is raw bytes
    async fn handle_bytes_response(&self, response: reqwest::Response) -> Result<Vec<u8>> {
        let bytes = self.check_status(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Handle an API response that returns no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        self.check_status(response).await.map(|_| ())
    }
}
