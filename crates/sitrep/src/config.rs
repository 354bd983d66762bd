//! Configuration management for sitrep.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::event::Filters;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "sitrep";

/// Default session file name.
const SESSION_FILE_NAME: &str = "session.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SITREP_`)
/// 2. TOML config file at `~/.config/sitrep/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feed source configuration.
    pub feeds: FeedsConfig,
    /// Polling configuration.
    pub poll: PollConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Default filter settings applied to a fresh session.
    pub filters: Filters,
}

/// Feed source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// Feed URLs to poll. All are enabled by default.
    pub urls: Vec<String>,
    /// Optional CORS-bypass proxy prefix. When set, each fetch is rewritten
    /// to `<prefix>?url=<percent-encoded target>`.
    pub proxy_prefix: Option<String>,
}

/// Polling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval between batch fetches in minutes. Minimum 1.
    pub interval_minutes: u64,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the session snapshot file.
    /// Defaults to `~/.local/share/sitrep/session.json`
    pub session_path: Option<PathBuf>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            urls: default_feed_urls(),
            proxy_prefix: None,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 5,
        }
    }
}

/// Default feed URLs, taken from the reference deployment.
fn default_feed_urls() -> Vec<String> {
    [
        "https://www.thenewhumanitarian.org/rss/all.xml",
        "https://theconversation.com/africa/articles.atom",
        "https://www.crisisgroup.org/rss/1",
        "https://news.un.org/feed/subscribe/en/news/region/africa/feed/rss.xml",
        "https://reliefweb.int/updates/rss.xml",
        "https://www.gdacs.org/xml/rss.xml",
        "https://travel.state.gov/_res/rss/TAsTWs.xml",
        "https://www.cisa.gov/cybersecurity-advisories/all.xml",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `SITREP_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("SITREP_").split("_"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.poll.interval_minutes < 1 {
            return Err(Error::ConfigValidation {
                message: "interval_minutes must be at least 1".to_string(),
            });
        }

        for url in &self.feeds.urls {
            if url.trim().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "feed URLs must not be empty".to_string(),
                });
            }
        }

        if let Some(prefix) = &self.feeds.proxy_prefix {
            if reqwest::Url::parse(prefix).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("proxy_prefix is not a valid URL: {prefix}"),
                });
            }
        }

        if self.filters.min_severity < 1 || self.filters.min_severity > 5 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "min_severity must be between 1 and 5, got {}",
                    self.filters.min_severity
                ),
            });
        }

        Ok(())
    }

    /// Get the session file path, resolving defaults if not set.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.storage
            .session_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(SESSION_FILE_NAME))
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_minutes * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.poll.interval_minutes, 5);
        assert!(config.feeds.proxy_prefix.is_none());
        assert!(!config.feeds.urls.is_empty());
        assert_eq!(config.filters.min_severity, 1);
        assert_eq!(config.filters.time_window_hours, 72);
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();
        assert!(storage.session_path.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.poll.interval_minutes = 0;

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("interval_minutes"));
    }

    #[test]
    fn test_validate_empty_feed_url() {
        let mut config = Config::default();
        config.feeds.urls.push("   ".to_string());

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("feed URLs"));
    }

    #[test]
    fn test_validate_bad_proxy_prefix() {
        let mut config = Config::default();
        config.feeds.proxy_prefix = Some("not a url".to_string());

        let result = config.validate();
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("proxy_prefix"));
    }

    #[test]
    fn test_validate_good_proxy_prefix() {
        let mut config = Config::default();
        config.feeds.proxy_prefix = Some("https://proxy.example.com/fetch".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_min_severity_out_of_range() {
        let mut config = Config::default();
        config.filters.min_severity = 6;

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("min_severity"));
    }

    #[test]
    fn test_session_path_default() {
        let config = Config::default();
        let path = config.session_path();
        assert!(path.to_string_lossy().contains("session.json"));
    }

    #[test]
    fn test_session_path_custom() {
        let mut config = Config::default();
        config.storage.session_path = Some(PathBuf::from("/custom/path/state.json"));
        assert_eq!(
            config.session_path(),
            PathBuf::from("/custom/path/state.json")
        );
    }

    #[test]
    fn test_poll_interval() {
        let config = Config::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(5 * 60));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("sitrep"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());

        let config = result.unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[poll]
interval_minutes = 10

[feeds]
urls = ["https://example.com/feed.xml"]
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.poll.interval_minutes, 10);
        assert_eq!(config.feeds.urls, vec!["https://example.com/feed.xml"]);
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("interval_minutes"));
        assert!(json.contains("urls"));
    }
}
