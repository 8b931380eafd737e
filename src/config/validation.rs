use crate::config::types::{
    Config, EtsLinkConfig, HttpConfig, LimitsConfig, LocationEntry, StorageConfig, T18Config,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_limits_config(&config.limits)?;
    validate_t18_config(&config.t18)?;
    validate_etslink_config(&config.etslink)?;
    validate_storage_config(&config.storage)?;
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_limits_config(config: &LimitsConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) cannot exceed backoff_max_ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    Ok(())
}

fn validate_t18_config(config: &T18Config) -> Result<(), ConfigError> {
    validate_base_url("t18.base_url", &config.base_url)?;
    validate_non_empty("t18.login_page", &config.login_page)?;
    validate_non_empty("t18.login_action", &config.login_action)?;
    validate_non_empty("t18.username_field", &config.username_field)?;
    validate_non_empty("t18.password_field", &config.password_field)?;
    validate_non_empty("t18.dashboard_path", &config.dashboard_path)?;
    Ok(())
}

fn validate_etslink_config(config: &EtsLinkConfig) -> Result<(), ConfigError> {
    validate_base_url("etslink.base_url", &config.base_url)?;
    validate_non_empty("etslink.login_path", &config.login_path)?;
    validate_non_empty("etslink.username_field", &config.username_field)?;
    validate_non_empty("etslink.password_field", &config.password_field)?;
    validate_non_empty("etslink.inquiry_path", &config.inquiry_path)?;
    validate_non_empty("etslink.terminal_param", &config.terminal_param)?;

    if let Some(path) = &config.locations_path {
        validate_non_empty("etslink.locations_path", path)?;
    }

    validate_locations(&config.locations)
}

fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    validate_non_empty("storage.database_path", &config.database_path)
}

/// Validates location codes: non-empty, alphanumeric, unique ignoring case
fn validate_locations(locations: &[LocationEntry]) -> Result<(), ConfigError> {
    if locations.is_empty() {
        return Err(ConfigError::Validation(
            "at least one location must be configured".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for entry in locations {
        validate_location_code(&entry.code)?;
        if !seen.insert(entry.code.to_ascii_uppercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location code '{}'",
                entry.code
            )));
        }
    }

    Ok(())
}

fn validate_location_code(code: &str) -> Result<(), ConfigError> {
    if code.is_empty() {
        return Err(ConfigError::Validation(
            "location code cannot be empty".to_string(),
        ));
    }

    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ConfigError::Validation(format!(
            "location code '{}' must be alphanumeric",
            code
        )));
    }

    Ok(())
}

fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field,
            url.scheme()
        )));
    }

    Ok(())
}

fn validate_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}
