//! Atelier API client for backend communication.
//!
//! This module provides the HTTP client for the Atelier backend,
//! including streaming responses via Server-Sent Events (SSE). The
//! client hands back the raw byte stream; framing and interpretation
//! live in [`crate::sse`] and [`crate::interpreter`] so the session owns
//! every byte after the status check.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

use crate::models::StreamRequest;
use crate::traits::{ByteStream, StreamTransport};

/// Default base URL when neither config nor environment overrides it.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the backend base URL.
pub const BASE_URL_ENV: &str = "INKWELL_API_URL";

/// Error type for Atelier client operations.
#[derive(Debug, Error)]
pub enum AtelierError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Server returned an error status
    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },
}

impl AtelierError {
    /// Status code of the rejection, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            AtelierError::Http(e) => e.status().map(|s| s.as_u16()),
            AtelierError::ServerError { status, .. } => Some(*status),
        }
    }
}

/// Configuration for the Atelier client.
///
/// Resolution order: explicit builder value, then `INKWELL_API_URL`,
/// then the default.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for the Atelier API
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { base_url }
    }
}

impl ClientConfig {
    /// Create a config with default resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Client for the Atelier backend API.
///
/// Provides streaming conversations, backend-side cancellation, and
/// health checks.
pub struct AtelierClient {
    /// Base URL for the Atelier API
    pub base_url: String,
    /// Reusable HTTP client
    client: Client,
}

impl AtelierClient {
    /// Create a client with default configuration.
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    /// Create a client with a custom base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::from_config(ClientConfig::new().with_base_url(base_url))
    }

    /// Create a client from a config.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url,
            client: Client::new(),
        }
    }

    /// Open a streaming response from the `/v1/stream` endpoint.
    ///
    /// Checks the HTTP status and returns the raw chunk stream. A non-2xx
    /// response is reported with its body before a single frame is
    /// decoded.
    pub async fn stream(&self, request: &StreamRequest) -> Result<ByteStream, AtelierError> {
        let url = format!("{}/v1/stream", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AtelierError::ServerError { status, message });
        }

        debug!(conversation = %request.conversation_key(), "stream connected");
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AtelierError::from));
        Ok(Box::pin(stream))
    }

    /// Ask the backend to stop generating for a conversation.
    pub async fn cancel_stream(&self, conversation_id: &str) -> Result<(), AtelierError> {
        let url = format!("{}/v1/cancel", self.base_url);

        let body = serde_json::json!({ "conversation_id": conversation_id });
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AtelierError::ServerError { status, message });
        }

        Ok(())
    }

    /// Check if the Atelier API is healthy and reachable.
    pub async fn health_check(&self) -> Result<bool, AtelierError> {
        let url = format!("{}/v1/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

impl Default for AtelierClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamTransport for AtelierClient {
    async fn stream(&self, request: &StreamRequest) -> Result<ByteStream, AtelierError> {
        AtelierClient::stream(self, request).await
    }

    async fn cancel_stream(&self, conversation_id: &str) -> Result<(), AtelierError> {
        AtelierClient::cancel_stream(self, conversation_id).await
    }

    async fn health_check(&self) -> Result<bool, AtelierError> {
        AtelierClient::health_check(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_with_base_url() {
        let client = AtelierClient::with_base_url("http://localhost:9999");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_config_builder_overrides_default() {
        let config = ClientConfig::new().with_base_url("http://10.0.0.1:8000");
        assert_eq!(config.base_url, "http://10.0.0.1:8000");
    }

    #[test]
    fn test_server_error_status() {
        let err = AtelierError::ServerError {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.status(), Some(503));
        let display = format!("{}", err);
        assert!(display.contains("503"));
        assert!(display.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_stream_with_unreachable_server() {
        let client = AtelierClient::with_base_url("http://127.0.0.1:1");
        let request = StreamRequest::new("test prompt".to_string());
        let result = client.stream(&request).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_with_unreachable_server() {
        let client = AtelierClient::with_base_url("http://127.0.0.1:1");
        let result = client.cancel_stream("conv-1").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_health_check_with_unreachable_server() {
        let client = AtelierClient::with_base_url("http://127.0.0.1:1");
        let result = client.health_check().await;
        assert!(result.is_err());
    }
}
