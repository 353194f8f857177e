use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Network failure fetching {url} after {attempts} attempt(s): {reason}")]
    NetworkError {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Request for {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("Extraction error: {0}")]
    ExtractionError(String),

    #[error("Swimmer '{name}' not found on {site}")]
    SwimmerNotFound { site: String, name: String },

    #[error("Invalid swimmer name: {0}")]
    InvalidName(String),

    #[error("{0} is unreachable")]
    Unreachable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ImporterError {
    /// Failures that say the site (or the path to it) is down, as opposed to
    /// problems with one swimmer's page.
    pub fn is_network(&self) -> bool {
        match self {
            Self::NetworkError { .. } | Self::Unreachable(_) => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::RequestError(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
