mod client;
pub mod extractor;

pub use client::SwimRankingsClient;

use std::sync::Arc;
use std::time::Duration;
use storage::models::SwimmerName;
use tracing::{debug, info, warn};

use crate::canonical::models::{RawRecord, SwimmerListing};
use crate::config::SiteConfig;
use crate::http::{ReachabilityProbe, Transport};
use crate::traits::ResultSource;
use crate::{ImporterError, Result};

/// swimrankings.net: athlete search, then one ranking-history page per style.
pub struct SwimRankingsSource {
    client: SwimRankingsClient,
    probe: ReachabilityProbe,
    config: SiteConfig,
}

impl SwimRankingsSource {
    pub fn new(transport: Arc<dyn Transport>, config: SiteConfig) -> Self {
        Self {
            client: SwimRankingsClient::new(transport.clone(), &config),
            probe: ReachabilityProbe::new(transport, config.base_url.clone(), config.probe.clone()),
            config,
        }
    }

    async fn fetch_style_records(
        &self,
        athlete_id: u64,
        styles: &[extractor::RankingStyle],
    ) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut network_failures = 0;
        let mut last_network_error = None;

        for (i, style) in styles.iter().enumerate() {
            if i > 0 && !self.config.style_delay.is_zero() {
                tokio::time::sleep(self.config.style_delay).await;
            }

            let url = self.client.style_url(athlete_id, style.id)?;
            match self.client.fetch_page(&url).await {
                Ok(html) => {
                    let rows = extractor::performance_records(&html, Some(&style.label));
                    debug!("{}: {} rows", style.label, rows.len());
                    records.extend(rows);
                }
                Err(e) => {
                    warn!("Skipping style '{}' (id {}): {}", style.label, style.id, e);
                    if e.is_network() {
                        network_failures += 1;
                        last_network_error = Some(e);
                    }
                }
            }
        }

        match last_network_error {
            Some(e) if network_failures == styles.len() => Err(e),
            _ => Ok(records),
        }
    }
}

#[async_trait::async_trait]
impl ResultSource for SwimRankingsSource {
    fn name(&self) -> &'static str {
        "SwimRankings"
    }

    fn swimmer_delay(&self) -> Duration {
        self.config.swimmer_delay
    }

    fn default_listing_url(&self) -> &str {
        &self.config.listing_url
    }

    async fn probe_reachable(&self) -> bool {
        self.probe.is_reachable().await
    }

    async fn list_swimmers(&self, listing_url: &str) -> Result<Vec<SwimmerListing>> {
        let html = self.client.fetch_page(listing_url).await?;
        Ok(extractor::athlete_listings(&html, listing_url))
    }

    async fn fetch_records(&self, swimmer: &SwimmerName) -> Result<Vec<RawRecord>> {
        let search_url = self.client.search_url(swimmer)?;
        let search_html = self.client.fetch_page(&search_url).await?;

        let detail_url = extractor::find_detail_link(&search_html, &search_url).ok_or_else(|| {
            ImporterError::SwimmerNotFound {
                site: self.name().to_string(),
                name: swimmer.full_name(),
            }
        })?;
        let detail_html = self.client.fetch_page(&detail_url).await?;

        let styles = extractor::ranking_styles(&detail_html);
        if styles.is_empty() {
            debug!("No style dropdown for {}, reading the detail page", swimmer.full_name());
            return Ok(extractor::performance_records(&detail_html, None));
        }

        let athlete_id = extractor::athlete_id(&detail_url).ok_or_else(|| {
            ImporterError::ExtractionError(format!("no athlete id in {}", detail_url))
        })?;

        info!(
            "{}: athlete {} with {} ranking styles",
            swimmer.full_name(),
            athlete_id,
            styles.len()
        );
        self.fetch_style_records(athlete_id, &styles).await
    }
}
