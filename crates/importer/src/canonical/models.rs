use serde::{Deserialize, Serialize};
use storage::models::{Course, Stroke, SwimmerName};

/// One result row as scraped, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// Event label, e.g. "50m Freestyle" or "100 vrije slag".
    pub event_text: String,
    /// Set when the site encodes the stroke unambiguously (URL codes).
    pub stroke: Option<Stroke>,
    pub time_text: String,
    pub date_text: Option<String>,
    pub course: Option<Course>,
    pub location: Option<String>,
}

impl RawRecord {
    pub fn new(event_text: impl Into<String>, time_text: impl Into<String>) -> Self {
        Self {
            event_text: event_text.into(),
            stroke: None,
            time_text: time_text.into(),
            date_text: None,
            course: None,
            location: None,
        }
    }
}

/// A swimmer as named on a site's listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwimmerListing {
    pub name: String,
    pub url: String,
}

impl SwimmerListing {
    /// Accepts "First Last" as well as the "LAST, First" form used on ranking lists.
    pub fn swimmer_name(&self) -> storage::Result<SwimmerName> {
        match self.name.split_once(',') {
            Some((last, first)) => SwimmerName::new(first, last),
            None => SwimmerName::parse_full(&self.name),
        }
    }
}
