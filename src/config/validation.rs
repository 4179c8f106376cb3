use crate::config::types::{Config, FetchConfig, OutputConfig, PollConfig, SiteConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_poll_config(&config.poll)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site section
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must be http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.listing_path.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "listing-path cannot be empty".to_string(),
        ));
    }

    if config.detail_path.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "detail-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the poll section
fn validate_poll_config(config: &PollConfig) -> Result<(), ConfigError> {
    if config.interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "interval-secs must be >= 1, got {}",
            config.interval_secs
        )));
    }

    if config.freshness_window_hours < 1 {
        return Err(ConfigError::Validation(format!(
            "freshness-window-hours must be >= 1, got {}",
            config.freshness_window_hours
        )));
    }

    Ok(())
}

/// Validates the fetch section
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_in_flight < 1 || config.max_in_flight > 100 {
        return Err(ConfigError::Validation(format!(
            "max-in-flight must be between 1 and 100, got {}",
            config.max_in_flight
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.retry_base_delay_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-base-delay-ms must be >= 1, got {}",
            config.retry_base_delay_ms
        )));
    }

    if config.retry_max_delay_ms < config.retry_base_delay_ms {
        return Err(ConfigError::Validation(format!(
            "retry-max-delay-ms ({}) must be >= retry-base-delay-ms ({})",
            config.retry_max_delay_ms, config.retry_base_delay_ms
        )));
    }

    if let Some(proxy) = &config.proxy_url {
        Url::parse(proxy)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy-url: {}", e)))?;
    }

    Ok(())
}

/// Validates the output section
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            site: SiteConfig {
                base_url: "http://example.onion".to_string(),
                listing_path: "/recent".to_string(),
                detail_path: "/torrent".to_string(),
            },
            poll: PollConfig {
                interval_secs: 60,
                freshness_window_hours: 24,
            },
            fetch: FetchConfig {
                max_in_flight: 20,
                request_timeout_secs: 30,
                connect_timeout_secs: 10,
                max_attempts: 5,
                retry_base_delay_ms: 500,
                retry_max_delay_ms: 30_000,
                proxy_url: None,
            },
            output: OutputConfig {
                database_path: "./index.db".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let mut config = valid_config();
        config.site.base_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = valid_config();
        config.site.base_url = "ftp://example.onion".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_in_flight() {
        let mut config = valid_config();
        config.fetch.max_in_flight = 0;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_oversized_in_flight() {
        let mut config = valid_config();
        config.fetch.max_in_flight = 500;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_backoff_cap_below_base() {
        let mut config = valid_config();
        config.fetch.retry_max_delay_ms = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_bad_proxy_url() {
        let mut config = valid_config();
        config.fetch.proxy_url = Some("::nope::".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_database_path() {
        let mut config = valid_config();
        config.output.database_path = String::new();
        assert!(validate(&config).is_err());
    }
}
