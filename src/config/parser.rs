use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gleaner::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Article budget: {}", config.crawl.max_articles);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is used to tell which configuration produced a given harvest run.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok((Config, String))` - Successfully loaded configuration and its hash
/// * `Err(ConfigError)` - Failed to load or parse the configuration
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[site]
base-domain = "news.example.com"
seed-urls = ["https://news.example.com/"]
article-pattern = "/(news|article)/.+/\\d+/\\d+$"

[crawl]
max-articles = 50
worker-threads = 5

[fetch]
user-agent = "TestAgent/1.0"
proxy-attempts-per-url = 3
request-delay-ms = 250

[proxy]
source-url = "https://proxies.example.com/list.txt"

[output]
database-path = "./test.db"

[extract]
title-selector = "h1.headline"
body-selector = "div.story-body"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.site.base_domain, "news.example.com");
        assert_eq!(config.crawl.max_articles, 50);
        assert_eq!(config.fetch.proxy_attempts_per_url, 3);
        assert_eq!(
            config.proxy.source_url.as_deref(),
            Some("https://proxies.example.com/list.txt")
        );
        assert_eq!(config.extract.paragraph_selector, "p, h2");
        assert!(config.extract.skip_selector.is_none());
    }

    #[test]
    fn test_load_config_defaults() {
        // fetch and proxy sections are optional
        let config_content = r#"
[site]
base-domain = "news.example.com"
seed-urls = ["https://news.example.com/"]
article-pattern = "/story/"

[crawl]
max-articles = 10
worker-threads = 2

[output]
database-path = "./test.db"

[extract]
title-selector = "h1"
body-selector = "article"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.fetch.proxy_attempts_per_url, 10);
        assert_eq!(config.fetch.request_delay_ms, 1000);
        assert!(config.fetch.user_agent.is_none());
        assert!(config.proxy.source_url.is_none());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[site]
base-domain = "news.example.com"
seed-urls = ["https://news.example.com/"]
article-pattern = "/story/"

[crawl]
max-articles = 0
worker-threads = 2

[output]
database-path = "./test.db"

[extract]
title-selector = "h1"
body-selector = "article"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let config_content = "test content";
        let file = create_temp_config(config_content);

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        // Same content should produce same hash
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64); // SHA-256 produces 64 hex characters
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
