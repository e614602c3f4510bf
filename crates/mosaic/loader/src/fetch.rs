//! Text fetching for markup and resources

use async_trait::async_trait;
use mosaic_types::{MosaicError, Result};
use reqwest::Client;
use tracing::debug;

/// Fetches the text body of a URL
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// [`Fetcher`] backed by reqwest
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxies, headers, TLS)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| MosaicError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MosaicError::transport(url, format!("HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| MosaicError::transport(url, e))
    }
}
