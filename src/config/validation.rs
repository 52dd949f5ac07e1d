use crate::config::types::{Config, EngineConfig, HttpConfig, OutputConfig, WaybackConfig};
use crate::ConfigError;
use url::Url;

const MAX_WORKERS: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_wayback_config(&config.wayback)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    validate_engine_config("posts", &config.posts)?;
    validate_engine_config("media", &config.media)?;
    Ok(())
}

fn validate_wayback_config(config: &WaybackConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;
    validate_http_url("cdx-url", &config.cdx_url)?;

    if config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "base-url must not end with '/', got '{}'",
            config.base_url
        )));
    }

    Ok(())
}

fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    for (field, path) in [
        ("tweets-dir", &config.tweets_dir),
        ("attaches-dir", &config.attaches_dir),
        ("list-dir", &config.list_dir),
    ] {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", field)));
        }
    }

    Ok(())
}

fn validate_engine_config(section: &str, config: &EngineConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "[{}] workers must be between 1 and {}, got {}",
            section, MAX_WORKERS, config.workers
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "[{}] max-attempts must be >= 1, got {}",
            section, config.max_attempts
        )));
    }

    Ok(())
}
