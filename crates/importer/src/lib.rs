pub mod canonical;
pub mod config;
pub mod error;
pub mod html;
pub mod http;
pub mod orchestrator;
pub mod parsing;
pub mod sources;
pub mod stroke_mapper;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ProbeConfig, RetryPolicy, SiteConfig};
pub use error::{ImporterError, Result};
pub use orchestrator::{
    ImportOrchestrator, ImportOutcome, ImportProgress, ImportState, ImportSummary,
    ResumeCheckpoint, SwimmerReport,
};
pub use sources::{Site, build_source};
pub use stroke_mapper::{KeywordStrokeMapper, StrokeMapper};
pub use traits::ResultSource;

// Re-export the concrete sources
pub use sources::swimrankings::SwimRankingsSource;
pub use sources::swimtrack::SwimTrackSource;
