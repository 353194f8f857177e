pub mod extractor;
mod stroke_mapper;

pub use stroke_mapper::SwimTrackStrokeMapper;

use std::sync::Arc;
use std::time::Duration;
use storage::models::SwimmerName;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::canonical::models::{RawRecord, SwimmerListing};
use crate::config::SiteConfig;
use crate::http::{ReachabilityProbe, ResilientFetcher, Transport};
use crate::traits::ResultSource;
use crate::{ImporterError, Result};

/// swimtrack.nl: a swimmer dropdown on one listing page, one personal page per swimmer.
pub struct SwimTrackSource {
    fetcher: ResilientFetcher,
    probe: ReachabilityProbe,
    config: SiteConfig,
    // The dropdown is the same for every swimmer of a run.
    listing_cache: Mutex<Option<Vec<SwimmerListing>>>,
}

impl SwimTrackSource {
    pub fn new(transport: Arc<dyn Transport>, config: SiteConfig) -> Self {
        Self {
            fetcher: ResilientFetcher::from_config(transport.clone(), &config),
            probe: ReachabilityProbe::new(transport, config.base_url.clone(), config.probe.clone()),
            config,
            listing_cache: Mutex::new(None),
        }
    }

    async fn default_listing(&self) -> Result<Vec<SwimmerListing>> {
        let mut cache = self.listing_cache.lock().await;
        if let Some(listings) = cache.as_ref() {
            return Ok(listings.clone());
        }

        let listings = self.list_swimmers(&self.config.listing_url).await?;
        if listings.is_empty() {
            return Err(ImporterError::ExtractionError(format!(
                "no swimmer dropdown on {}",
                self.config.listing_url
            )));
        }
        info!("{} swimmers listed on {}", listings.len(), self.config.listing_url);
        *cache = Some(listings.clone());
        Ok(listings)
    }
}

#[async_trait::async_trait]
impl ResultSource for SwimTrackSource {
    fn name(&self) -> &'static str {
        "SwimTrack"
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
        let html = self.fetcher.fetch(listing_url).await?;
        Ok(extractor::swimmer_options(&html, listing_url))
    }

    async fn fetch_records(&self, swimmer: &SwimmerName) -> Result<Vec<RawRecord>> {
        let listings = self.default_listing().await?;
        let listing = extractor::find_swimmer(&listings, swimmer).ok_or_else(|| {
            ImporterError::SwimmerNotFound {
                site: self.name().to_string(),
                name: swimmer.full_name(),
            }
        })?;

        debug!("{} -> {}", swimmer.full_name(), listing.url);
        let html = self.fetcher.fetch(&listing.url).await?;
        Ok(extractor::time_records(&html))
    }
}
