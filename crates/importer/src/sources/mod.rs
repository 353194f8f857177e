pub mod swimrankings;
pub mod swimtrack;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::SiteConfig;
use crate::http::Transport;
use crate::traits::ResultSource;
use crate::{ImporterError, Result};

pub use swimrankings::SwimRankingsSource;
pub use swimtrack::SwimTrackSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    SwimRankings,
    SwimTrack,
}

impl Site {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SwimRankings => "swimrankings",
            Self::SwimTrack => "swimtrack",
        }
    }

    pub fn all() -> &'static [Site] {
        &[Self::SwimRankings, Self::SwimTrack]
    }

    /// Default settings for the site with environment overrides applied.
    pub fn config_from_env(&self) -> Result<SiteConfig> {
        match self {
            Self::SwimRankings => {
                SiteConfig::swimrankings().with_env_overrides("SWIMRANKINGS_BASE_URL")
            }
            Self::SwimTrack => SiteConfig::swimtrack().with_env_overrides("SWIMTRACK_BASE_URL"),
        }
    }

    fn parse_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['_', '-', '.'], "");
        match normalized.as_str() {
            "swimrankings" | "swimrankingsnet" | "rankings" | "sr" => Ok(Self::SwimRankings),
            "swimtrack" | "swimtracknl" | "track" | "st" => Ok(Self::SwimTrack),
            _ => Err(ImporterError::ConfigError(format!(
                "Unknown site: '{}'. Available: {}",
                s,
                Self::all()
                    .iter()
                    .map(|site| site.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl FromStr for Site {
    type Err = ImporterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn build_source(
    site: Site,
    transport: Arc<dyn Transport>,
    config: SiteConfig,
) -> Box<dyn ResultSource> {
    match site {
        Site::SwimRankings => Box::new(SwimRankingsSource::new(transport, config)),
        Site::SwimTrack => Box::new(SwimTrackSource::new(transport, config)),
    }
}
