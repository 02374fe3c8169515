//! HTTP utilities
//!
//! One shared client per run; sources that need a cookie session build
//! their own. Every request carries the configured timeout.

use reqwest::cookie::Jar;
use reqwest::header::HeaderMap;
use reqwest::{Client, ClientBuilder, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::downloader::config::DownloadConfig;
use crate::downloader::core::{DownloadError, Result};

/// Shared HTTP client for all fetch tasks of a run
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client from download configuration
    pub fn from_config(config: &DownloadConfig) -> Result<Self> {
        Self::build(config, Client::builder())
    }

    /// Client that stores and replays cookies through `jar`
    ///
    /// Cookies set on redirect responses are stored too, since the client
    /// follows redirects itself.
    pub fn with_cookies(config: &DownloadConfig, jar: Arc<Jar>) -> Result<Self> {
        Self::build(config, Client::builder().cookie_provider(jar))
    }

    fn build(config: &DownloadConfig, builder: ClientBuilder) -> Result<Self> {
        let client = builder
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| DownloadError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
                field: None,
            })?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// Issue a GET with extra request headers; any status is returned
    pub async fn get(&self, url: &Url, headers: HeaderMap) -> Result<Response> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))?;
        debug!("GET {} -> {}", url, response.status());
        Ok(response)
    }

    /// Like [`HttpClient::get`] but non-2xx statuses are [`DownloadError::HttpStatus`]
    pub async fn get_success(&self, url: &Url, headers: HeaderMap) -> Result<Response> {
        let response = self.get(url, headers).await?;
        ensure_success(url, response)
    }

    /// GET and read the whole body as text
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self.get_success(url, HeaderMap::new()).await?;
        response.text().await.map_err(|e| self.request_error(url, e))
    }

    pub(crate) fn request_error(&self, url: &Url, error: reqwest::Error) -> DownloadError {
        if error.is_timeout() {
            DownloadError::NetworkTimeout {
                url: url.to_string(),
                duration_secs: self.timeout.as_secs(),
            }
        } else {
            DownloadError::HttpRequest {
                url: url.to_string(),
                source: error,
            }
        }
    }
}

pub fn ensure_success(url: &Url, response: Response) -> Result<Response> {
    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status(),
        });
    }
    Ok(response)
}
