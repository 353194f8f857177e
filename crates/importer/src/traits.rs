use crate::Result;
use crate::canonical::models::{RawRecord, SwimmerListing};
use std::time::Duration;
use storage::models::SwimmerName;

/// A results website the orchestrator can import from.
#[async_trait::async_trait]
pub trait ResultSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Politeness pause between two swimmers of a roster run.
    fn swimmer_delay(&self) -> Duration;

    fn default_listing_url(&self) -> &str;

    async fn probe_reachable(&self) -> bool;

    /// Swimmers named on a listing page, in page order.
    async fn list_swimmers(&self, listing_url: &str) -> Result<Vec<SwimmerListing>>;

    /// Every result candidate the site shows for one swimmer.
    async fn fetch_records(&self, swimmer: &SwimmerName) -> Result<Vec<RawRecord>>;
}
