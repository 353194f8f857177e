use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::Result;

pub type TransportResult<T> = std::result::Result<T, TransportError>;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Worth retrying: timeouts, dropped connections, 5xx and 429.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connect(_) => true,
            Self::Status(status) => *status >= 500 || *status == 429,
            Self::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() || e.is_body() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Other(e.to_string())
        }
    }
}

/// The HTTP operations the importer needs. `ReqwestTransport` is the real one;
/// tests script responses per URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Body of a successful GET. Non-2xx statuses come back as `Status`.
    async fn get(&self, url: &Url, timeout: Duration) -> TransportResult<String>;

    async fn head_status(&self, url: &Url, timeout: Duration) -> TransportResult<u16>;

    /// Status of a GET without reading the body.
    async fn get_status(&self, url: &Url, timeout: Duration) -> TransportResult<u16>;

    async fn resolve(&self, host: &str, port: u16) -> bool {
        match tokio::net::lookup_host((host, port)).await {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(e) => {
                tracing::debug!("DNS lookup for {} failed: {}", host, e);
                false
            }
        }
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(browser_headers())
            .gzip(true)
            .deflate(true)
            .build()?;

        Ok(Self { client })
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, timeout: Duration) -> TransportResult<String> {
        let response = self.client.get(url.clone()).timeout(timeout).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }

    async fn head_status(&self, url: &Url, timeout: Duration) -> TransportResult<u16> {
        let response = self.client.head(url.clone()).timeout(timeout).send().await?;
        Ok(response.status().as_u16())
    }

    async fn get_status(&self, url: &Url, timeout: Duration) -> TransportResult<u16> {
        let response = self.client.get(url.clone()).timeout(timeout).send().await?;
        Ok(response.status().as_u16())
    }
}
