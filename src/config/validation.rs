use crate::config::types::{Config, CrawlerConfig, HttpConfig, RateLimitConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth < 1 {
        return Err(ConfigError::Validation(
            "max_depth must be >= 1 (the seed is depth 1)".to_string(),
        ));
    }

    if config.max_visited < 1 {
        return Err(ConfigError::Validation(format!(
            "max_visited must be >= 1, got {}",
            config.max_visited
        )));
    }

    if config.workers < 1 || config.workers > 1024 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 1024, got {}",
            config.workers
        )));
    }

    if config.result_buffer == Some(0) {
        return Err(ConfigError::Validation(
            "result_buffer must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates rate limiter configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if !config.requests_per_second.is_finite() || config.requests_per_second <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "requests_per_second must be a positive number, got {}",
            config.requests_per_second
        )));
    }

    if config.burst < 1 {
        return Err(ConfigError::Validation(format!(
            "burst must be >= 1, got {}",
            config.burst
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.max_body_bytes < 1 {
        return Err(ConfigError::Validation(
            "max_body_bytes must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("user_agent", &config.user_agent),
        ("accept", &config.accept),
        ("accept_language", &config.accept_language),
    ] {
        if value.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "{} must not contain control characters",
                name
            )));
        }
    }

    Ok(())
}
