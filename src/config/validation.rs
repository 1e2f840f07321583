use crate::config::types::{Config, CrawlerConfig, PublisherConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_publisher_config(&config.publisher)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 || config.connect_timeout_secs > config.request_timeout_secs
    {
        return Err(ConfigError::Validation(format!(
            "connect_timeout_secs must be between 1 and request_timeout_secs ({}), got {}",
            config.request_timeout_secs, config.connect_timeout_secs
        )));
    }

    if config.max_redirects > 20 {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be <= 20, got {}",
            config.max_redirects
        )));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max_body_bytes must be at least 1024, got {}",
            config.max_body_bytes
        )));
    }

    if config.retry_attempts > 5 {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be <= 5, got {}",
            config.retry_attempts
        )));
    }

    for pattern in &config.default_blacklist {
        validate_block_pattern(pattern)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_publisher_config(config: &PublisherConfig) -> Result<(), ConfigError> {
    if config.channel_capacity < 1 {
        return Err(ConfigError::Validation(
            "channel_capacity must be >= 1".to_string(),
        ));
    }
    Ok(())
}

/// Validates a block-list pattern
///
/// Accepted shapes are a host (`ads.example.com`), a wildcard host
/// (`*.example.com`), or a suffix starting with a dot (`.pdf`).
pub fn validate_block_pattern(pattern: &str) -> Result<(), ConfigError> {
    let trimmed = pattern.trim();

    if trimmed.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Block pattern cannot be empty".to_string(),
        ));
    }

    if trimmed.chars().any(char::is_whitespace) {
        return Err(ConfigError::InvalidPattern(format!(
            "Block pattern '{}' contains whitespace",
            pattern
        )));
    }

    if trimmed == "." || trimmed == "*." {
        return Err(ConfigError::InvalidPattern(format!(
            "Block pattern '{}' matches nothing useful",
            pattern
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
