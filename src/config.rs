//! Configuration file parser for ~/.config/newsdeck/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::gateway::{HttpGatewayOptions, MAX_TRENDING_LIMIT};
use crate::session::{SessionError, UserId};
use crate::util::{validate_base_url, UrlValidationError};

/// Environment variable that overrides `user_id` from the file.
pub const USER_ID_ENV: &str = "NEWSDECK_USER_ID";

/// Backend used when the file does not name one.
pub const DEFAULT_BASE_URL: &str = "https://news-backend-gz40.onrender.com";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid base_url: {0}")]
    BaseUrl(#[from] UrlValidationError),

    #[error("Invalid value for {key}: {reason}")]
    OutOfRange { key: &'static str, reason: String },

    #[error("No user id configured: pass --user, set NEWSDECK_USER_ID, or add user_id to the config file")]
    MissingUserId,

    #[error("Invalid user id: {0}")]
    UserId(#[from] SessionError),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the news backend. Must be https unless it is loopback.
    pub base_url: String,

    /// Identity sent as the `user-id` header.
    /// `NEWSDECK_USER_ID` and `--user` take precedence.
    pub user_id: Option<String>,

    /// Articles per feed page.
    pub page_size: usize,

    /// Number of trending articles requested (1..=50).
    pub trending_limit: u32,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_id: None,
            page_size: 5,
            trending_limit: 5,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 5] = [
        "base_url",
        "user_id",
        "page_size",
        "trending_limit",
        "request_timeout_secs",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Out-of-range values → `Err` from [`validate`](Self::validate)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            base_url = %config.base_url,
            page_size = config.page_size,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!("Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse as a raw table first to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges and the base URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_base_url(&self.base_url)?;
        if self.page_size == 0 {
            return Err(ConfigError::OutOfRange {
                key: "page_size",
                reason: "must be greater than 0".to_string(),
            });
        }
        if !(1..=MAX_TRENDING_LIMIT).contains(&self.trending_limit) {
            return Err(ConfigError::OutOfRange {
                key: "trending_limit",
                reason: format!("must be between 1 and {MAX_TRENDING_LIMIT}"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::OutOfRange {
                key: "request_timeout_secs",
                reason: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Pick the user id: `cli` over `env` over the file.
    pub fn resolve_user_id(
        &self,
        cli: Option<&str>,
        env: Option<&str>,
    ) -> Result<UserId, ConfigError> {
        let raw = cli
            .or(env)
            .or(self.user_id.as_deref())
            .ok_or(ConfigError::MissingUserId)?;
        Ok(UserId::new(raw)?)
    }

    pub fn gateway_options(&self) -> HttpGatewayOptions {
        HttpGatewayOptions {
            timeout: Duration::from_secs(self.request_timeout_secs),
            ..HttpGatewayOptions::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.user_id.is_none());
        assert_eq!(config.page_size, 5);
        assert_eq!(config.trending_limit, 5);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/newsdeck_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let config = Config::from_toml("page_size = 10\n").unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.trending_limit, 5);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
base_url = "http://localhost:8000"
user_id = "reader_42"
page_size = 8
trending_limit = 20
request_timeout_secs = 5
"#;
        let config = Config::from_toml(content).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.user_id.as_deref(), Some("reader_42"));
        assert_eq!(config.page_size, 8);
        assert_eq!(config.trending_limit, 20);
        assert_eq!(config.gateway_options().timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let err = Config::from_toml("this is not [valid toml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let content = r#"
page_size = 5
theme = "dark"
"#;
        assert!(Config::from_toml(content).is_ok());
    }

    #[test]
    fn test_wrong_type_returns_error() {
        assert!(Config::from_toml("page_size = \"five\"\n").is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = Config::from_toml("page_size = 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                key: "page_size",
                ..
            }
        ));
    }

    #[test]
    fn test_trending_limit_bounds() {
        assert!(Config::from_toml("trending_limit = 50\n").is_ok());
        assert!(Config::from_toml("trending_limit = 51\n").is_err());
        assert!(Config::from_toml("trending_limit = 0\n").is_err());
    }

    #[test]
    fn test_insecure_base_url_rejected() {
        let err = Config::from_toml("base_url = \"http://news.example.com\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::BaseUrl(_)));
    }

    #[test]
    fn test_user_id_precedence() {
        let config = Config {
            user_id: Some("from_file".into()),
            ..Config::default()
        };
        let cli = config.resolve_user_id(Some("from_cli"), Some("from_env")).unwrap();
        assert_eq!(cli.as_str(), "from_cli");
        let env = config.resolve_user_id(None, Some("from_env")).unwrap();
        assert_eq!(env.as_str(), "from_env");
        let file = config.resolve_user_id(None, None).unwrap();
        assert_eq!(file.as_str(), "from_file");
    }

    #[test]
    fn test_missing_user_id() {
        let err = Config::default().resolve_user_id(None, None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingUserId));
        let blank = Config::default().resolve_user_id(Some("  "), None);
        assert!(matches!(blank, Err(ConfigError::UserId(_))));
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("newsdeck_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        // Write a file just over 1MB
        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
