//! Client configuration.
//!
//! Configuration lives in `~/.lightbox/config.json` and can be
//! overridden per invocation through environment variables:
//!
//! - `LIGHTBOX_API_URL` replaces the API base URL
//! - `LIGHTBOX_TOKEN` replaces the access token
//! - `LIGHTBOX_POLL_INTERVAL` replaces the poll interval (seconds)

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The config directory name.
const CONFIG_DIR: &str = ".lightbox";

/// The config file name.
const CONFIG_FILE: &str = "config.json";

/// Environment override for the API base URL.
pub const ENV_API_URL: &str = "LIGHTBOX_API_URL";

/// Environment override for the access token.
pub const ENV_TOKEN: &str = "LIGHTBOX_TOKEN";

/// Environment override for the poll interval, in seconds.
pub const ENV_POLL_INTERVAL: &str = "LIGHTBOX_POLL_INTERVAL";

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_events_enabled() -> bool {
    true
}

/// Errors from configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No API base URL configured.
    #[error("no API base URL configured (set {} or api_base_url in the config file)", ENV_API_URL)]
    MissingBaseUrl,

    /// No access token configured.
    #[error("no access token configured (set {} or access_token in the config file)", ENV_TOKEN)]
    MissingToken,
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Base URL of the photo API, e.g. `https://photos.example.com/api`.
    #[serde(default)]
    pub api_base_url: String,
    /// Bearer token for API authentication.
    #[serde(default)]
    pub access_token: String,
    /// Status poll interval in seconds.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Whether to maintain a live event stream connection.
    #[serde(default = "default_events_enabled")]
    pub events_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            access_token: String::new(),
            poll_interval_secs: default_poll_interval_secs(),
            events_enabled: default_events_enabled(),
        }
    }
}

impl Config {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the access token.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = token.into();
        self
    }

    /// The poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Apply environment variable overrides.
    ///
    /// Empty values are ignored. An unparseable poll interval keeps
    /// the configured value.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            if !token.trim().is_empty() {
                self.access_token = token;
            }
        }
        if let Ok(raw) = std::env::var(ENV_POLL_INTERVAL) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.poll_interval_secs = secs,
                _ => {
                    tracing::warn!("ignoring invalid {}: {:?}", ENV_POLL_INTERVAL, raw);
                }
            }
        }
    }

    /// Check that the config is complete enough to reach the API.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }
        if self.access_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(())
    }
}

/// Manages config storage and retrieval.
#[derive(Debug)]
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        let config_path = home.join(CONFIG_DIR).join(CONFIG_FILE);
        Some(Self { config_path })
    }

    /// Get the path to the config file.
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load the config from the config file.
    ///
    /// Returns the default config if the file doesn't exist or can't be read.
    pub fn load(&self) -> Config {
        if !self.config_path.exists() {
            return Config::default();
        }

        let file = match File::open(&self.config_path) {
            Ok(f) => f,
            Err(_) => return Config::default(),
        };

        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(config) => config,
            Err(_) => Config::default(),
        }
    }

    /// Save the config to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    /// Returns `true` if successful, `false` otherwise.
    pub fn save(&self, config: &Config) -> bool {
        if let Some(parent) = self.config_path.parent() {
            if !parent.exists() && fs::create_dir_all(parent).is_err() {
                return false;
            }
        }

        let file = match File::create(&self.config_path) {
            Ok(f) => f,
            Err(_) => return false,
        };

        let mut writer = BufWriter::new(file);
        if serde_json::to_writer_pretty(&mut writer, config).is_err() {
            return false;
        }

        writer.flush().is_ok()
    }
}

/// Load the effective config: file contents, then environment overrides.
pub fn load() -> Config {
    let mut config = match ConfigManager::new() {
        Some(manager) => manager.load(),
        None => Config::default(),
    };
    config.apply_env();
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    // Helper to create a ConfigManager with a custom path
    fn create_test_manager(temp_dir: &TempDir) -> ConfigManager {
        let config_path = temp_dir.path().join(CONFIG_DIR).join(CONFIG_FILE);
        ConfigManager { config_path }
    }

    fn clear_env() {
        std::env::remove_var(ENV_API_URL);
        std::env::remove_var(ENV_TOKEN);
        std::env::remove_var(ENV_POLL_INTERVAL);
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.api_base_url.is_empty());
        assert!(config.access_token.is_empty());
        assert_eq!(config.poll_interval_secs, 5);
        assert!(config.events_enabled);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new()
            .with_api_base_url("https://photos.example.com/api")
            .with_access_token("tok_123");
        assert_eq!(config.api_base_url, "https://photos.example.com/api");
        assert_eq!(config.access_token, "tok_123");
    }

    #[test]
    fn test_poll_interval_duration() {
        let mut config = Config::default();
        config.poll_interval_secs = 30;
        assert_eq!(config.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_validate_missing_base_url() {
        let config = Config::new().with_access_token("tok");
        assert_eq!(config.validate(), Err(ConfigError::MissingBaseUrl));
    }

    #[test]
    fn test_validate_missing_token() {
        let config = Config::new().with_api_base_url("https://api.example.com");
        assert_eq!(config.validate(), Err(ConfigError::MissingToken));
    }

    #[test]
    fn test_validate_whitespace_only_is_missing() {
        let config = Config::new()
            .with_api_base_url("   ")
            .with_access_token("tok");
        assert_eq!(config.validate(), Err(ConfigError::MissingBaseUrl));
    }

    #[test]
    fn test_validate_complete_config() {
        let config = Config::new()
            .with_api_base_url("https://api.example.com")
            .with_access_token("tok");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_manager_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);
        assert_eq!(manager.load(), Config::default());
    }

    #[test]
    fn test_manager_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);

        let config = Config {
            api_base_url: "https://photos.example.com/api".to_string(),
            access_token: "tok_abc".to_string(),
            poll_interval_secs: 10,
            events_enabled: false,
        };

        assert!(manager.save(&config));
        assert_eq!(manager.load(), config);
    }

    #[test]
    fn test_manager_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);

        assert!(!manager.config_path.parent().unwrap().exists());
        assert!(manager.save(&Config::default()));
        assert!(manager.config_path.parent().unwrap().exists());
    }

    #[test]
    fn test_manager_load_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let manager = create_test_manager(&temp_dir);

        fs::create_dir_all(manager.config_path.parent().unwrap()).unwrap();
        fs::write(&manager.config_path, "not valid json").unwrap();

        assert_eq!(manager.load(), Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_base_url": "https://api.example.com"}"#).unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.poll_interval_secs, 5);
        assert!(config.events_enabled);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let config: Config = serde_json::from_str(
            r#"{"api_base_url": "https://api.example.com", "theme": "dark"}"#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com");
    }

    #[test]
    #[serial]
    fn test_apply_env_overrides() {
        clear_env();
        std::env::set_var(ENV_API_URL, "https://override.example.com");
        std::env::set_var(ENV_TOKEN, "tok_env");
        std::env::set_var(ENV_POLL_INTERVAL, "12");

        let mut config = Config::new()
            .with_api_base_url("https://file.example.com")
            .with_access_token("tok_file");
        config.apply_env();

        assert_eq!(config.api_base_url, "https://override.example.com");
        assert_eq!(config.access_token, "tok_env");
        assert_eq!(config.poll_interval_secs, 12);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_apply_env_ignores_empty_and_invalid() {
        clear_env();
        std::env::set_var(ENV_API_URL, "  ");
        std::env::set_var(ENV_POLL_INTERVAL, "not-a-number");

        let mut config = Config::new()
            .with_api_base_url("https://file.example.com")
            .with_access_token("tok_file");
        config.apply_env();

        assert_eq!(config.api_base_url, "https://file.example.com");
        assert_eq!(config.poll_interval_secs, 5);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_apply_env_rejects_zero_interval() {
        clear_env();
        std::env::set_var(ENV_POLL_INTERVAL, "0");

        let mut config = Config::default();
        config.apply_env();
        assert_eq!(config.poll_interval_secs, 5);
        clear_env();
    }
}
