//! HTTP client wrapper with automatic payload decompression
//!
//! Provider responses can be large (full VOD catalogues, multi-day EPG), so
//! the request timeout is generous while the connect timeout fails fast.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::utils::url::UrlUtils;
use crate::utils::{CompressionFormat, DecompressionService};

/// HTTP client trait that provides automatic decompression for all content
///
/// The source handlers are generic over this trait so tests can drive them
/// with a stub transport.
#[async_trait]
pub trait DecompressingHttpClient: Send + Sync {
    /// Fetch URL and return decompressed text content
    async fn fetch_text(&self, url: &str) -> AppResult<String>;

    /// Fetch URL and return decompressed JSON content
    async fn fetch_json<T: DeserializeOwned + Send>(&self, url: &str) -> AppResult<T>;

    /// Fetch URL and return raw decompressed bytes
    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>>;
}

/// Default implementation of DecompressingHttpClient using reqwest
#[derive(Clone)]
pub struct StandardHttpClient {
    client: Client,
}

impl StandardHttpClient {
    /// Create a new HTTP client with the given connect/request timeouts
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(AppError::Http)?;

        Ok(Self { client })
    }

    /// Process response into decompressed bytes
    async fn process_response_to_bytes(response: Response, url: &str) -> AppResult<Vec<u8>> {
        if !response.status().is_success() {
            return Err(AppError::source_error(format!(
                "HTTP error: {} {} - URL: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown"),
                UrlUtils::obfuscate_credentials(url)
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::source_error(format!("Failed to read response: {e}")))?;

        debug!("Fetched {} bytes of raw content", bytes.len());

        let decompressed = match DecompressionService::detect_compression_format(&bytes) {
            CompressionFormat::Uncompressed => bytes.to_vec(),
            format => {
                debug!("Content is compressed ({format:?}), decompressing");
                DecompressionService::decompress(bytes)
                    .map_err(|e| AppError::source_error(format!("Failed to decompress: {e}")))?
            }
        };

        Ok(decompressed)
    }
}

#[async_trait]
impl DecompressingHttpClient for StandardHttpClient {
    async fn fetch_text(&self, url: &str) -> AppResult<String> {
        let bytes = self.fetch_bytes(url).await?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::source_error(format!("Response is not valid UTF-8: {e}")))
    }

    async fn fetch_json<T: DeserializeOwned + Send>(&self, url: &str) -> AppResult<T> {
        let text = self.fetch_text(url).await?;
        serde_json::from_str(&text).map_err(|e| {
            AppError::source_error(format!(
                "Failed to parse JSON from {}: {e}",
                UrlUtils::obfuscate_credentials(url)
            ))
        })
    }

    async fn fetch_bytes(&self, url: &str) -> AppResult<Vec<u8>> {
        debug!("Fetching {}", UrlUtils::obfuscate_credentials(url));

        let response = self.client.get(url).send().await?;
        Self::process_response_to_bytes(response, url).await
    }
}
