use crate::config::types::{
    Config, CrawlerConfig, DelayRange, IngestConfig, OutputConfig, SelectorConfig, SiteConfig,
    UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Longest pause any delay setting may ask for (seconds)
const MAX_DELAY_SECONDS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    validate_ingest_config(&config.ingest)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.root_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid root-url '{}': {}", config.root_url, e)))?;

    // Plain HTTP is accepted so the crawler can be pointed at local mock servers
    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "root-url '{}' must use http or https",
            config.root_url
        )));
    }

    if config.page_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "page-param cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency-limit must be between 1 and 100, got {}",
            config.concurrency_limit
        )));
    }

    validate_delay_range("delay-between-pages", &config.delay_between_pages)?;
    validate_delay_range("delay-between-categories", &config.delay_between_categories)?;

    if config.request_timeout_seconds < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-seconds must be >= 1".to_string(),
        ));
    }

    if config.max_pages_per_category < 1 {
        return Err(ConfigError::Validation(
            "max-pages-per-category must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_delay_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must contain finite, non-negative seconds, got [{}, {}]",
            name, range.min, range.max
        )));
    }

    if range.max > MAX_DELAY_SECONDS {
        return Err(ConfigError::Validation(format!(
            "{} maximum ({}) exceeds {} seconds",
            name, range.max, MAX_DELAY_SECONDS
        )));
    }

    if range.min > range.max {
        return Err(ConfigError::Validation(format!(
            "{} minimum ({}) exceeds maximum ({})",
            name, range.min, range.max
        )));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent value cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII
    if !config.value.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        return Err(ConfigError::Validation(format!(
            "user-agent value contains characters not allowed in a header: '{}'",
            config.value
        )));
    }

    if !config
        .accept_language
        .chars()
        .all(|c| c.is_ascii() && !c.is_ascii_control())
    {
        return Err(ConfigError::Validation(format!(
            "accept-language contains characters not allowed in a header: '{}'",
            config.accept_language
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.snapshot_dir.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot-dir cannot be empty".to_string(),
        ));
    }

    if config.structure_path.is_empty() {
        return Err(ConfigError::Validation(
            "structure-path cannot be empty".to_string(),
        ));
    }

    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_ingest_config(config: &IngestConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "ingest concurrency-limit must be between 1 and 100, got {}",
            config.concurrency_limit
        )));
    }

    if !config.delay_before_request.is_finite()
        || !(0.0..=MAX_DELAY_SECONDS).contains(&config.delay_before_request)
    {
        return Err(ConfigError::Validation(format!(
            "delay-before-request must be between 0 and {} seconds, got {}",
            MAX_DELAY_SECONDS,
            config.delay_before_request
        )));
    }

    Ok(())
}

/// Every selector must compile; a typo should fail at startup, not mid-run
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    config.compile().map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_delay_range() {
        assert!(validate_delay_range("d", &DelayRange::new(0.0, 0.0)).is_ok());
        assert!(validate_delay_range("d", &DelayRange::new(1.0, 2.5)).is_ok());

        assert!(validate_delay_range("d", &DelayRange::new(3.0, 2.0)).is_err());
        assert!(validate_delay_range("d", &DelayRange::new(-1.0, 2.0)).is_err());
        assert!(validate_delay_range("d", &DelayRange::new(0.0, f64::NAN)).is_err());
    }

    #[test]
    fn test_oversized_delays_rejected() {
        assert!(validate_delay_range("d", &DelayRange::new(0.0, MAX_DELAY_SECONDS)).is_ok());
        assert!(validate_delay_range("d", &DelayRange::new(1.0, 1e300)).is_err());

        let ingest = IngestConfig {
            delay_before_request: 1e300,
            ..IngestConfig::default()
        };
        assert!(validate_ingest_config(&ingest).is_err());
    }

    #[test]
    fn test_validate_site_config() {
        let mut site = SiteConfig {
            root_url: "https://shop.example.com/".to_string(),
            page_param: "PAGEN_1".to_string(),
        };
        assert!(validate_site_config(&site).is_ok());

        site.root_url = "ftp://shop.example.com/".to_string();
        assert!(validate_site_config(&site).is_err());

        site.root_url = "not a url".to_string();
        assert!(matches!(
            validate_site_config(&site),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_default_selectors_compile() {
        assert!(validate_selectors(&SelectorConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let selectors = SelectorConfig {
            product_link: "a[[".to_string(),
            ..SelectorConfig::default()
        };
        assert!(matches!(
            validate_selectors(&selectors),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }

    #[test]
    fn test_user_agent_rejects_control_chars() {
        let ua = UserAgentConfig {
            value: "Bot\n1.0".to_string(),
            ..UserAgentConfig::default()
        };
        assert!(validate_user_agent_config(&ua).is_err());
        assert!(validate_user_agent_config(&UserAgentConfig::default()).is_ok());
    }
}
