//! Private HTTP client for SoundTouch device communication
//!
//! This crate provides a minimal async HTTP client for the SoundTouch
//! command protocol: plain `GET` for queries and form-encoded `POST` for
//! mutations, both answered with an XML document. It also owns the XML
//! parsing primitive used by the higher layers.
//!
//! The [`Transport`] trait is the seam between the protocol layer and the
//! network, so tests can substitute a scripted device.

mod error;

pub use error::HttpError;

use std::time::Duration;

use async_trait::async_trait;
use xmltree::Element;

/// Raw response returned by a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body, expected to be an XML document
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status code is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body with [`parse_xml`]
    pub fn xml(&self) -> Result<Element, HttpError> {
        parse_xml(&self.body)
    }
}

/// Request/response transport used by the command client
///
/// Implementations must not retry: a failure is reported once as
/// [`HttpError::Network`] and the caller decides what to do with it.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Issue a `GET` request
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;

    /// Issue a `POST` request with a form-encoded body
    async fn post(&self, url: &str, body: &str) -> Result<HttpResponse, HttpError>;
}

/// A minimal HTTP client for SoundTouch devices
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(5), Duration::from_secs(10))
    }

    /// Create a client with explicit connect and whole-request timeouts
    pub fn with_timeouts(connect: Duration, request: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect)
            .timeout(request)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client configuration");
                reqwest::Client::new()
            });
        Self { client }
    }

    async fn read(response: reqwest::Response) -> Result<HttpResponse, HttpError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        tracing::trace!(url, "GET");
        let response = self.client.get(url).send().await?;
        Self::read(response).await
    }

    async fn post(&self, url: &str, body: &str) -> Result<HttpResponse, HttpError> {
        tracing::trace!(url, body, "POST");
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await?;
        Self::read(response).await
    }
}

/// Parse an XML document into its root element
pub fn parse_xml(text: &str) -> Result<Element, HttpError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(HttpError::Parse("Empty response body".to_string()));
    }
    Element::parse(trimmed.as_bytes()).map_err(|e| HttpError::Parse(e.to_string()))
}
