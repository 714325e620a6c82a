//! Product catalog API client
//!
//! Wraps `reqwest::Client` with the catalog base URL and a fixed request
//! timeout, and classifies every failure into a [`FetchError`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use catsync_core::domain::Selector;
//! use catsync_remote::client::CatalogClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = CatalogClient::new("https://catalog.example", Duration::from_secs(10))?;
//! let snapshot = client.fetch_snapshot(Selector::OnMain).await?;
//! println!("{} products", snapshot.products.len());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use catsync_core::domain::{FetchError, Selector, Snapshot};

/// Path of the products endpoint relative to the base URL
const PRODUCTS_PATH: &str = "/api/products";

/// Default request timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// ============================================================================
// Response envelope
// ============================================================================

/// Top-level body of `/api/products`
///
/// The sections are flattened into [`Snapshot`]; `status` is the success
/// marker and `message` explains a non-`ok` status.
#[derive(Debug, Deserialize)]
struct ProductsEnvelope {
    status: Option<String>,
    #[serde(default)]
    message: Option<Value>,
    #[serde(flatten)]
    snapshot: Snapshot,
}

// ============================================================================
// CatalogClient
// ============================================================================

/// HTTP client for the remote catalog
pub struct CatalogClient {
    /// The underlying HTTP client, carrying the request timeout
    client: Client,
    /// Base URL without a trailing slash
    base_url: String,
}

impl CatalogClient {
    /// Creates a client for `base_url` whose requests time out after `timeout`
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client with the default 10 second timeout
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    /// Wraps an existing `reqwest::Client`
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for one selector
    pub fn products_url(&self, selector: Selector) -> String {
        format!(
            "{}{}?on_main={}",
            self.base_url,
            PRODUCTS_PATH,
            selector.as_query()
        )
    }

    /// Fetches one snapshot
    ///
    /// Issues exactly one request; there is no retry here.
    ///
    /// # Errors
    /// - [`FetchError::Timeout`] when the request exceeds the timeout
    /// - [`FetchError::Network`] when the connection fails
    /// - [`FetchError::Protocol`] on a non-2xx status
    /// - [`FetchError::BadResponse`] when the body is not the expected JSON
    ///   or its `status` is not `"ok"`
    pub async fn fetch_snapshot(&self, selector: Selector) -> Result<Snapshot, FetchError> {
        let url = self.products_url(selector);
        debug!(%url, "Fetching catalog snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%selector, status = status.as_u16(), "Catalog API returned error status");
            return Err(FetchError::Protocol {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify_transport_error)?;
        let snapshot = parse_snapshot(&body)?;

        debug!(
            %selector,
            categories = snapshot.categories.len(),
            marks = snapshot.product_marks.len(),
            products = snapshot.products.len(),
            "Catalog snapshot received"
        );
        Ok(snapshot)
    }
}

/// Maps a reqwest failure onto the timeout/network split
fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(err.to_string())
    } else if err.is_decode() || err.is_body() {
        FetchError::BadResponse(err.to_string())
    } else {
        FetchError::Network(err.to_string())
    }
}

/// Decodes the body and checks the `status` marker
pub(crate) fn parse_snapshot(body: &[u8]) -> Result<Snapshot, FetchError> {
    let envelope: ProductsEnvelope = serde_json::from_slice(body)
        .map_err(|e| FetchError::BadResponse(format!("invalid JSON body: {e}")))?;

    match envelope.status.as_deref() {
        Some("ok") => Ok(envelope.snapshot),
        Some(other) => {
            let message = match envelope.message {
                Some(Value::String(s)) => s,
                Some(Value::Null) | None => "no message".to_string(),
                Some(other) => other.to_string(),
            };
            Err(FetchError::BadResponse(format!(
                "status '{other}': {message}"
            )))
        }
        None => Err(FetchError::BadResponse(
            "missing status marker".to_string(),
        )),
    }
}
