use std::time::Duration;

use crate::{ImporterError, Result};

pub const SWIMRANKINGS_BASE_URL: &str = "https://www.swimrankings.net";
pub const SWIMTRACK_BASE_URL: &str = "https://www.swimtrack.nl";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait before retry `n` is `n * base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_before_retry(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub dns_timeout: Duration,
    pub head_timeout: Duration,
    pub get_timeout: Duration,
    pub retry_delay: Duration,
    pub probe_path: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            dns_timeout: Duration::from_secs(3),
            head_timeout: Duration::from_secs(5),
            get_timeout: Duration::from_secs(7),
            retry_delay: Duration::from_millis(500),
            probe_path: "/robots.txt".to_string(),
        }
    }
}

/// Per-site connection and pacing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub base_url: String,
    pub listing_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub swimmer_delay: Duration,
    pub style_delay: Duration,
    pub probe: ProbeConfig,
}

impl SiteConfig {
    pub fn swimrankings() -> Self {
        Self::swimrankings_at(SWIMRANKINGS_BASE_URL)
    }

    pub fn swimtrack() -> Self {
        Self::swimtrack_at(SWIMTRACK_BASE_URL)
    }

    pub fn swimrankings_at(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            listing_url: format!(
                "{}/index.php?page=athleteSelect&nationId=0&selectPage=SEARCH",
                base_url
            ),
            base_url,
            request_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            swimmer_delay: Duration::from_millis(500),
            style_delay: Duration::from_millis(300),
            probe: ProbeConfig::default(),
        }
    }

    pub fn swimtrack_at(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            listing_url: format!("{}/ez-pc/perstijden.php", base_url),
            base_url,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            swimmer_delay: Duration::from_millis(200),
            style_delay: Duration::ZERO,
            probe: ProbeConfig::default(),
        }
    }

    /// Applies `SWIMRANKINGS_BASE_URL` / `SWIMTRACK_BASE_URL`, `IMPORT_MAX_ATTEMPTS`
    /// and `IMPORT_RETRY_DELAY_MS` on top of `self`.
    pub fn with_env_overrides(self, base_url_var: &str) -> Result<Self> {
        let mut config = match std::env::var(base_url_var) {
            Ok(url) if !url.trim().is_empty() => self.rebased(url.trim()),
            _ => self,
        };

        if let Ok(raw) = std::env::var("IMPORT_MAX_ATTEMPTS") {
            let attempts: u32 = raw.trim().parse().map_err(|_| {
                ImporterError::ConfigError(format!(
                    "IMPORT_MAX_ATTEMPTS must be a number, got '{}'",
                    raw
                ))
            })?;
            if attempts == 0 {
                return Err(ImporterError::ConfigError(
                    "IMPORT_MAX_ATTEMPTS must be at least 1".to_string(),
                ));
            }
            config.retry.max_attempts = attempts;
        }

        if let Ok(raw) = std::env::var("IMPORT_RETRY_DELAY_MS") {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                ImporterError::ConfigError(format!(
                    "IMPORT_RETRY_DELAY_MS must be a number, got '{}'",
                    raw
                ))
            })?;
            config.retry.base_delay = Duration::from_millis(millis);
        }

        Ok(config)
    }

    /// Moves the site to another origin, keeping the listing page's path.
    pub fn rebased(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        if let Some(path) = self.listing_url.strip_prefix(&self.base_url) {
            self.listing_url = format!("{}{}", base_url, path);
        }
        self.base_url = base_url;
        self
    }

    /// Zero politeness and retry delays, for tests and local mirrors.
    pub fn without_delays(mut self) -> Self {
        self.swimmer_delay = Duration::ZERO;
        self.style_delay = Duration::ZERO;
        self.retry.base_delay = Duration::ZERO;
        self.probe.retry_delay = Duration::ZERO;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_defaults() {
        let rankings = SiteConfig::swimrankings();
        assert_eq!(rankings.request_timeout, Duration::from_secs(60));
        assert_eq!(rankings.style_delay, Duration::from_millis(300));
        assert_eq!(rankings.retry.max_attempts, 3);

        let track = SiteConfig::swimtrack();
        assert_eq!(track.listing_url, "https://www.swimtrack.nl/ez-pc/perstijden.php");
        assert_eq!(track.swimmer_delay, Duration::from_millis(200));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before_retry(1), Duration::from_secs(1));
        assert_eq!(policy.delay_before_retry(2), Duration::from_secs(2));
    }

    #[test]
    fn test_rebased_keeps_listing_path() {
        let config = SiteConfig::swimtrack().rebased("http://127.0.0.1:8080/");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.listing_url, "http://127.0.0.1:8080/ez-pc/perstijden.php");
    }
}
