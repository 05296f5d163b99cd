use crate::config::types::{
    Config, CrawlConfig, ExtractConfig, FetchConfig, OutputConfig, ProxyConfig, SiteConfig,
};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawl_config(&config.crawl)?;
    validate_fetch_config(&config.fetch)?;
    validate_proxy_config(&config.proxy)?;
    validate_output_config(&config.output)?;
    validate_extract_config(&config.extract)?;
    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_domain_string(&config.base_domain)?;

    if config.seed_urls.is_empty() {
        return Err(ConfigError::Validation(
            "seed-urls must contain at least one URL".to_string(),
        ));
    }

    for seed in &config.seed_urls {
        let url = Url::parse(seed)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "Seed URL '{}' must use an http or https scheme",
                seed
            )));
        }
    }

    Regex::new(&config.article_pattern).map_err(|e| {
        ConfigError::InvalidPattern(format!(
            "article-pattern '{}' is not a valid regex: {}",
            config.article_pattern, e
        ))
    })?;

    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_articles < 1 {
        return Err(ConfigError::Validation(format!(
            "max-articles must be >= 1, got {}",
            config.max_articles
        )));
    }

    if config.worker_threads < 1 || config.worker_threads > 64 {
        return Err(ConfigError::Validation(format!(
            "worker-threads must be between 1 and 64, got {}",
            config.worker_threads
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user-agent cannot be blank; omit the key to rotate agents".to_string(),
            ));
        }
    }

    if config.proxy_attempts_per_url > 100 {
        return Err(ConfigError::Validation(format!(
            "proxy-attempts-per-url must be <= 100, got {}",
            config.proxy_attempts_per_url
        )));
    }

    if config.request_delay_ms > 600_000 {
        return Err(ConfigError::Validation(format!(
            "request-delay-ms must be <= 600000 (10 minutes), got {}",
            config.request_delay_ms
        )));
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if let Some(source) = &config.source_url {
        Url::parse(source).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy source-url '{}': {}", source, e))
        })?;
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if let Some(log_path) = &config.log_path {
        if log_path.is_empty() {
            return Err(ConfigError::Validation(
                "log-path cannot be empty; omit the key to log to stderr".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates extraction selectors by compiling each one
fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    validate_selector("title-selector", &config.title_selector)?;
    validate_selector("body-selector", &config.body_selector)?;
    validate_selector("paragraph-selector", &config.paragraph_selector)?;
    if let Some(skip) = &config.skip_selector {
        validate_selector("skip-selector", skip)?;
    }
    Ok(())
}

/// Validates a single CSS selector string
fn validate_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} cannot be empty",
            field
        )));
    }

    Selector::parse(selector).map_err(|e| {
        ConfigError::Validation(format!("{} '{}' is not a valid selector: {:?}", field, selector, e))
    })?;

    Ok(())
}

/// Validates a bare domain string (no scheme, no wildcard)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "base-domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "base-domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "base-domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "base-domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "base-domain '{}' must contain at least one dot (e.g., 'example.com')",
            domain
        )));
    }

    Ok(())
}
