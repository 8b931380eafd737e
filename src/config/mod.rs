//! Configuration module for terminal-scraper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use terminal_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scraper.toml")).unwrap();
//! println!("At most {} requests in flight", config.limits.max_concurrent);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, EtsLinkConfig, HttpConfig, LimitsConfig, LocationEntry, StorageConfig, T18Config,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
