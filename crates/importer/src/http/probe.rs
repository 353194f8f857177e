use std::sync::Arc;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::debug;
use url::Url;

use super::fetcher::parse_http_url;
use super::transport::Transport;
use crate::config::ProbeConfig;

/// Cheap "is the site up" check run before a long import.
///
/// Never errors: every step is time-boxed and any failure just means "not
/// reachable". Total time is bounded by the sum of the configured timeouts.
pub struct ReachabilityProbe {
    transport: Arc<dyn Transport>,
    base_url: String,
    config: ProbeConfig,
}

fn is_reachable_status(status: u16) -> bool {
    status < 500 && status != 405
}

impl ReachabilityProbe {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        config: ProbeConfig,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            config,
        }
    }

    pub async fn is_reachable(&self) -> bool {
        let Ok(base) = parse_http_url(&self.base_url) else {
            debug!("Probe skipped, invalid base URL {}", self.base_url);
            return false;
        };
        let Some(host) = base.host_str() else {
            return false;
        };
        let port = base.port_or_known_default().unwrap_or(443);

        match timeout(self.config.dns_timeout, self.transport.resolve(host, port)).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Probe: {} does not resolve", host);
                return false;
            }
            Err(_) => {
                debug!("Probe: DNS lookup for {} timed out", host);
                return false;
            }
        }

        if self.head_ok(&base).await {
            return true;
        }
        if self.get_ok(&base).await {
            return true;
        }

        tokio::time::sleep(self.config.retry_delay).await;
        self.get_ok(&base).await
    }

    async fn head_ok(&self, base: &Url) -> bool {
        let limit = self.config.head_timeout;
        match timeout(limit, self.transport.head_status(base, limit)).await {
            Ok(Ok(status)) => {
                debug!("Probe: HEAD {} -> {}", base, status);
                is_reachable_status(status)
            }
            Ok(Err(e)) => {
                debug!("Probe: HEAD {} failed: {}", base, e);
                false
            }
            Err(_) => false,
        }
    }

    /// GET of the probe path, falling back to the base page on a 404. Both
    /// requests share one `get_timeout` budget.
    async fn get_ok(&self, base: &Url) -> bool {
        let limit = self.config.get_timeout;
        let deadline = Instant::now() + limit;
        let target = base.join(&self.config.probe_path).unwrap_or_else(|_| base.clone());

        match timeout_at(deadline, self.transport.get_status(&target, limit)).await {
            Ok(Ok(404)) if target != *base => {
                debug!("Probe: {} missing, checking the base page", target);
                let remaining = deadline.saturating_duration_since(Instant::now());
                matches!(
                    timeout_at(deadline, self.transport.get_status(base, remaining)).await,
                    Ok(Ok(status)) if is_reachable_status(status)
                )
            }
            Ok(Ok(status)) => {
                debug!("Probe: GET {} -> {}", target, status);
                is_reachable_status(status)
            }
            Ok(Err(e)) => {
                debug!("Probe: GET {} failed: {}", target, e);
                false
            }
            Err(_) => false,
        }
    }
}
