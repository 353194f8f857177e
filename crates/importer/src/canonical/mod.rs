pub mod dedup;
pub mod models;
pub mod normalizer;

pub use dedup::{DedupEngine, ImportCounts};
pub use models::{RawRecord, SwimmerListing};
pub use normalizer::{NormalizedBatch, RecordNormalizer};
