//! terminal-scraper: scrape engine for shipping-terminal portals
//!
//! This crate logs into terminal web portals, fetches their pages under a
//! shared rate limit and reduces the HTML to link and table records. Runs
//! against multi-location portals fan out across locations and tolerate
//! per-location failure.

pub mod adapter;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod model;
pub mod orchestrator;
pub mod state;
pub mod storage;

use std::sync::Arc;
use thiserror::Error;

/// Main error type for terminal-scraper operations
///
/// Scrape failures (validation, login, fetch) are reported inside
/// [`ScrapeResult`]; this type covers setup and persistence.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for terminal-scraper operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use adapter::{build_adapter, AuthError, Portal, SiteAdapter};
pub use config::Config;
pub use fetch::{FetchError, Fetcher, RateLimiter};
pub use model::{
    Credential, LinkRecord, LocationResult, LogEvent, LogKind, PageData, ScrapeData,
    ScrapeResult, TableRecord,
};
pub use orchestrator::{Orchestrator, ScrapeRequest, ValidationError};
pub use state::RunState;

/// Runs one scrape with the adapter selected by `request.portal`
///
/// # Returns
///
/// * `Ok(ScrapeResult)` - The run result, including runs that failed
///   validation or login (`success == false`)
/// * `Err(ScrapeError)` - The adapter could not be built from `config`
pub async fn scrape(config: &Config, request: &ScrapeRequest) -> Result<ScrapeResult> {
    let fetcher = Arc::new(Fetcher::from_config(config));
    let adapter = build_adapter(request.portal, config, Arc::clone(&fetcher))?;

    let orchestrator = Orchestrator::new(adapter.as_ref(), fetcher.limiter().max_concurrent());
    Ok(orchestrator.run(request).await)
}
