//! HTTP client for the product API.
//!
//! One `GET <base>/api/v3/product/<identifier>.json` per lookup, no retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scanner_core::{LookupOutcome, ProductIdentifier, ProductLookup, ProductRecord};
use thiserror::Error;
use url::Url;

use crate::payload::ProductResponse;

/// Public Open Food Facts instance.
pub const DEFAULT_LOOKUP_URL: &str = "https://world.openfoodfacts.org";

/// Errors that can occur when talking to the product API.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The configured base URL is invalid.
    #[error("invalid product API URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, body read).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("status {0}")]
    Status(u16),
    /// The response body was not the expected JSON.
    #[error("malformed product payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Base URL of the product API host.
    pub base_url: String,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LOOKUP_URL.to_string(),
            timeout: None,
            user_agent: format!("barcode-scanner/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LookupConfig {
    /// Default settings against a different host.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// Asynchronous product API client.
#[derive(Clone)]
pub struct LookupClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
}

impl LookupClient {
    /// Create a client with default settings against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidUrl`] if the URL is malformed.
    /// Returns [`LookupError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self, LookupError> {
        Self::with_config(LookupConfig::with_base_url(base_url.as_ref()))
    }

    /// Create a client from explicit settings.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidUrl`] if the URL is malformed or cannot
    /// carry a path.
    /// Returns [`LookupError::Http`] if the HTTP client fails to build.
    pub fn with_config(config: LookupConfig) -> Result<Self, LookupError> {
        let base =
            Url::parse(&config.base_url).map_err(|e| LookupError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(LookupError::InvalidUrl(format!(
                "{} cannot carry a path",
                config.base_url
            )));
        }

        let mut builder = Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            inner: Arc::new(InnerClient { http, base }),
        })
    }

    /// Request URL for a product.
    #[must_use]
    pub fn product_url(&self, identifier: &ProductIdentifier) -> Url {
        let mut url = self.inner.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v3", "product"])
                .push(&format!("{identifier}.json"));
        }
        url
    }

    /// Fetch a product. `Ok(None)` means the service has no product payload.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Status`] for non-success responses,
    /// [`LookupError::Http`] for transport failures and
    /// [`LookupError::Json`] for bodies that do not parse.
    pub async fn fetch(
        &self,
        identifier: &ProductIdentifier,
    ) -> Result<Option<ProductRecord>, LookupError> {
        let url = self.product_url(identifier);
        tracing::debug!(%url, "requesting product");

        let response = self.inner.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let payload: ProductResponse = serde_json::from_slice(&body)?;
        Ok(payload
            .product
            .map(|product| product.into_record(identifier.clone())))
    }
}

#[async_trait]
impl ProductLookup for LookupClient {
    async fn lookup(&self, identifier: &ProductIdentifier) -> LookupOutcome {
        match self.fetch(identifier).await {
            Ok(Some(record)) => LookupOutcome::Found(record),
            Ok(None) => LookupOutcome::NotFound,
            Err(e) => {
                tracing::debug!(%identifier, "lookup error: {e}");
                LookupOutcome::TransientError(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scanner_core::{DecodeEvent, ScanFilter};

    fn id(code: &str) -> ProductIdentifier {
        ScanFilter::accept(&DecodeEvent::decoded(code)).expect("valid")
    }

    #[test]
    fn test_product_url_default_host() {
        let client = LookupClient::new(DEFAULT_LOOKUP_URL).unwrap();
        assert_eq!(
            client.product_url(&id("3017620422003")).as_str(),
            "https://world.openfoodfacts.org/api/v3/product/3017620422003.json"
        );
    }

    #[test]
    fn test_product_url_keeps_base_path() {
        let client = LookupClient::new("http://localhost:8080/off/").unwrap();
        assert_eq!(
            client.product_url(&id("42")).as_str(),
            "http://localhost:8080/off/api/v3/product/42.json"
        );
    }

    #[test]
    fn test_invalid_urls_rejected() {
        assert!(matches!(
            LookupClient::new("not a url"),
            Err(LookupError::InvalidUrl(_))
        ));
        assert!(matches!(
            LookupClient::new("mailto:someone@example.com"),
            Err(LookupError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_status_error_message() {
        assert_eq!(LookupError::Status(404).to_string(), "status 404");
    }
}
