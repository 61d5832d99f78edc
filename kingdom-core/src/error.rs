//! Error types for kingdom-core

use thiserror::Error;

/// Unified error type for catalog lookups
#[derive(Debug, Error)]
pub enum KingdomError {
    /// Caller supplied an unusable argument; nothing was fetched
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// HTTP request could not complete (DNS, connect, TLS, body read)
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// Catalog answered with an anti-automation interstitial instead of results
    #[error("catalog returned a bot-check page for {url}")]
    Blocked { url: String },
    /// Set reference list could not be loaded
    #[error("set list unavailable: {0}")]
    SetSource(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias for kingdom-core operations
pub type Result<T> = std::result::Result<T, KingdomError>;
