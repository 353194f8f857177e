use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::transport::{Transport, TransportError};
use crate::config::{RetryPolicy, SiteConfig};
use crate::{ImporterError, Result};

/// GET with bounded linear-backoff retries on transient failures.
pub struct ResilientFetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
    timeout: Duration,
}

impl ResilientFetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            transport,
            policy,
            timeout,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &SiteConfig) -> Self {
        Self::new(transport, config.retry, config.request_timeout)
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        let parsed = parse_http_url(url)?;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = TransportError::Other("no attempt made".to_string());

        for attempt in 1..=max_attempts {
            match self.transport.get(&parsed, self.timeout).await {
                Ok(body) => {
                    if attempt > 1 {
                        debug!("Fetched {} on attempt {}", url, attempt);
                    }
                    return Ok(body);
                }
                Err(e) if e.is_transient() => {
                    warn!("Attempt {}/{} for {} failed: {}", attempt, max_attempts, url, e);
                    last_error = e;
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.delay_before_retry(attempt)).await;
                    }
                }
                Err(TransportError::Status(status)) => {
                    return Err(ImporterError::HttpStatus {
                        status,
                        url: url.to_string(),
                    });
                }
                Err(e) => {
                    return Err(ImporterError::RequestFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Err(ImporterError::NetworkError {
            url: url.to_string(),
            attempts: max_attempts,
            reason: last_error.to_string(),
        })
    }
}

pub(crate) fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| ImporterError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ImporterError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
