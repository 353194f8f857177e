use std::sync::Arc;
use storage::models::SwimmerName;
use url::Url;

use crate::config::SiteConfig;
use crate::http::{ResilientFetcher, Transport};
use crate::{ImporterError, Result};

pub struct SwimRankingsClient {
    base_url: String,
    fetcher: ResilientFetcher,
}

impl SwimRankingsClient {
    pub fn new(transport: Arc<dyn Transport>, config: &SiteConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            fetcher: ResilientFetcher::from_config(transport, config),
        }
    }

    fn index_url(&self, params: &[(&str, &str)]) -> Result<String> {
        let endpoint = format!("{}/index.php", self.base_url);
        Url::parse_with_params(&endpoint, params)
            .map(|url| url.to_string())
            .map_err(|e| ImporterError::InvalidUrl {
                url: endpoint,
                reason: e.to_string(),
            })
    }

    pub fn search_url(&self, name: &SwimmerName) -> Result<String> {
        self.index_url(&[
            ("internalRequest", "athleteFind"),
            ("athlete_firstname", name.first()),
            ("athlete_lastname", name.last()),
            ("athlete_clubId", "-1"),
            ("athlete_gender", "-1"),
        ])
    }

    pub fn style_url(&self, athlete_id: u64, style_id: u32) -> Result<String> {
        self.index_url(&[
            ("page", "athleteDetail"),
            ("athleteId", &athlete_id.to_string()),
            ("styleId", &style_id.to_string()),
        ])
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        self.fetcher.fetch(url).await
    }
}
