use crate::config::types::{Config, FetcherConfig, PolicyConfig, SchedulerConfig, StoreConfig};
use crate::ConfigError;

/// Upper bound for the scheduler delays: one year in milliseconds
const MAX_DELAY_MS: u64 = 365 * 24 * 60 * 60 * 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_store_config(&config.store)?;
    validate_policy_config(&config.policy)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 1024 {
        return Err(ConfigError::Validation(format!(
            "scheduler workers must be between 1 and 1024, got {}",
            config.workers
        )));
    }

    if config.max_retry < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retry must be >= 1, got {}",
            config.max_retry
        )));
    }

    for (name, value) in [
        ("min_revisit_delay", config.min_revisit_delay),
        ("retry_delay", config.retry_delay),
    ] {
        if value > MAX_DELAY_MS {
            return Err(ConfigError::Validation(format!(
                "{} must be at most {} ms, got {}",
                name, MAX_DELAY_MS, value
            )));
        }
    }

    if config.queue_capacity < 1 {
        return Err(ConfigError::Validation(
            "queue_capacity must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "fetcher workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout < 1 {
        return Err(ConfigError::Validation(
            "timeout must be at least one second".to_string(),
        ));
    }

    Ok(())
}

/// Validates store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.database_path {
        if path.is_empty() {
            return Err(ConfigError::Validation(
                "database_path cannot be empty; omit it to keep records in memory".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates policy scope patterns
fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    for pattern in &config.scope {
        validate_domain_pattern(pattern)?;
    }
    Ok(())
}

/// Validates that every seed survives normalization
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        crate::url::normalize(seed).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e))
        })?;
    }
    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    let domain = pattern.strip_prefix("*.").unwrap_or(pattern);
    if domain == "localhost" || pattern.parse::<std::net::IpAddr>().is_ok() {
        return Ok(());
    }

    if !crate::url::is_domain_name(domain) {
        return Err(ConfigError::InvalidPattern(format!(
            "'{}' is not a valid domain pattern",
            pattern
        )));
    }

    Ok(())
}
