use crate::config::types::{
    Config, CrawlerConfig, SinkConfig, SinkFailureMode, SinkKind, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_sink_config(&config.sink)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 100 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 100, got {}",
            config.workers
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Crawler name: non-empty, alphanumeric + hyphens only
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

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("contact_url '{}': {}", contact_url, e))
        })?;
    }

    if let Some(email) = &config.contact_email {
        validate_email(email)?;
    }

    Ok(())
}

/// Validates sink configuration
fn validate_sink_config(config: &SinkConfig) -> Result<(), ConfigError> {
    match config.kind {
        SinkKind::Http => {
            let endpoint = Url::parse(&config.endpoint).map_err(|e| {
                ConfigError::InvalidUrl(format!("sink endpoint '{}': {}", config.endpoint, e))
            })?;
            if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
                return Err(ConfigError::InvalidUrl(format!(
                    "sink endpoint must be http or https, got '{}'",
                    config.endpoint
                )));
            }
        }
        SinkKind::Sqlite => {
            if config.database_path.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "database_path cannot be empty for the sqlite sink".to_string(),
                ));
            }
        }
        SinkKind::Log => {}
    }

    if config.failure_policy == SinkFailureMode::Retry && config.retry_attempts < 1 {
        return Err(ConfigError::Validation(
            "retry_attempts must be >= 1 when failure_policy is retry".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
