use crate::config::types::{Config, CrawlerConfig, OutputConfig, SiteConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.index_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid index_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "index_url must use HTTP or HTTPS, got '{}'",
            url.scheme()
        )));
    }

    if config.file_extensions.is_empty() {
        return Err(ConfigError::Validation(
            "file_extensions cannot be empty".to_string(),
        ));
    }

    for ext in &config.file_extensions {
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Validation(format!(
                "file extension must be alphanumeric without a leading dot, got '{}'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates pacing and retry configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.backoff_base_ms < 1 {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms must be >= 1, got {}",
            config.backoff_base_ms
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
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

    // Validate contact URL
    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    // Validate contact email (basic validation)
    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email shape check: one '@' with non-empty local part and a dotted domain
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "contact_email does not look like an email address: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> Config {
        Config {
            site: SiteConfig {
                index_url: "https://example.com/midis".to_string(),
                file_extensions: vec!["mid".to_string(), "midi".to_string()],
            },
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig {
                crawler_name: "TestMirror".to_string(),
                crawler_version: "1.0".to_string(),
                contact_url: "https://example.com/about".to_string(),
                contact_email: "admin@example.com".to_string(),
            },
            output: OutputConfig {
                directory: "./mirrored".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = create_test_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_invalid_index_url() {
        let mut config = create_test_config();
        config.site.index_url = "not a url".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_non_http_index_url() {
        let mut config = create_test_config();
        config.site.index_url = "ftp://example.com/midis".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_extensions_rejected() {
        let mut config = create_test_config();
        config.site.file_extensions.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_extension_with_dot_rejected() {
        let mut config = create_test_config();
        config.site.file_extensions = vec![".mid".to_string()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = create_test_config();
        config.crawler.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_backoff_rejected() {
        let mut config = create_test_config();
        config.crawler.backoff_base_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_crawler_name_rejected() {
        let mut config = create_test_config();
        config.user_agent.crawler_name = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_crawler_name_with_spaces_rejected() {
        let mut config = create_test_config();
        config.user_agent.crawler_name = "Test Mirror".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_bad_email_rejected() {
        let mut config = create_test_config();
        config.user_agent.contact_email = "not-an-email".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_output_directory_rejected() {
        let mut config = create_test_config();
        config.output.directory = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_negative_limit_is_valid() {
        let mut config = create_test_config();
        config.crawler.limit = -1;
        assert!(validate(&config).is_ok());
    }
}
