//! Configuration loading and validation.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::models::Tag;

/// Environment variable holding the game API key.
pub const GAME_API_KEY_VAR: &str = "BRAWLSTARS_API_KEY";

/// Environment variable holding the LLM API key.
pub const AI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("{0} must be set in the environment or .env")]
    MissingSecret(&'static str),
}

/// Game API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,

    /// How long a successful response is served from the cache
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,

    /// Enables the on-disk cache when set
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Retries for transient failures (5xx, network)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_api_base_url() -> String {
    "https://api.brawlstars.com/v1".to_string()
}

fn default_api_timeout() -> u64 {
    10
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    2
}

/// Upper bound accepted for `api.max_retries`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

fn default_retry_delay() -> u64 {
    500
}

impl Default for GameApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_seconds: default_api_timeout(),
            cache_ttl_seconds: default_cache_ttl(),
            cache_dir: None,
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

/// AI summary configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_enabled")]
    pub enabled: bool,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_ai_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Timeout in seconds
    #[serde(default = "default_ai_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_ai_enabled() -> bool {
    true
}

fn default_ai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_ai_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    300
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: default_ai_enabled(),
            base_url: default_ai_base_url(),
            model: default_model(),
            timeout_seconds: default_ai_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// A club offered in the club picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedClub {
    pub name: String,
    pub tag: String,
}

impl FeaturedClub {
    fn new(name: &str, tag: &str) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.to_string(),
        }
    }
}

fn default_clubs() -> Vec<FeaturedClub> {
    vec![
        FeaturedClub::new("Spike", "#2YJQ8LRCG"),
        FeaturedClub::new("grand", "#CV2LQLQU"),
        FeaturedClub::new("MA NAJJACI SMOO", "#2UU9ULJUR"),
        FeaturedClub::new("i pro", "#GRP8LQJ8"),
    ]
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub api: GameApiConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default = "default_clubs")]
    pub clubs: Vec<FeaturedClub>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api: GameApiConfig::default(),
            ai: AiConfig::default(),
            server: ServerConfig::default(),
            clubs: default_clubs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            info!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if self.ai.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "AI timeout must be greater than 0".to_string(),
            ));
        }

        if self.api.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "api.max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        for (field, url) in [("api.base_url", &self.api.base_url), ("ai.base_url", &self.ai.base_url)] {
            Url::parse(url).map_err(|e| {
                ConfigError::ValidationError(format!("{} {:?} is not a URL: {}", field, url, e))
            })?;
        }

        for club in &self.clubs {
            Tag::parse(&club.tag).map_err(|e| {
                ConfigError::ValidationError(format!("featured club {:?}: {}", club.name, e))
            })?;
        }

        Ok(())
    }
}

/// API keys read from the environment.
#[derive(Clone)]
pub struct Secrets {
    pub game_api_key: String,
    pub ai_api_key: String,
}

impl Secrets {
    /// Read both keys from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read both keys through `lookup`. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingSecret(name))
        };

        Ok(Self {
            game_api_key: require(GAME_API_KEY_VAR)?,
            ai_api_key: require(AI_API_KEY_VAR)?,
        })
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("game_api_key", &"<redacted>")
            .field("ai_api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.api.base_url, "https://api.brawlstars.com/v1");
        assert_eq!(config.api.cache_ttl_seconds, 300);
        assert_eq!(config.api.cache_dir, None);
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.ai.max_tokens, 300);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.clubs.len(), 4);
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_timeouts() {
        let mut config = AppConfig::default();
        config.api.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.ai.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bounds_retries() {
        let mut config = AppConfig::default();
        config.api.max_retries = MAX_RETRIES_LIMIT;
        assert!(config.validate().is_ok());

        config.api.max_retries = 1000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_retries"));
    }

    #[test]
    fn test_config_validation_bad_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_bad_club_tag() {
        let mut config = AppConfig::default();
        config.clubs.push(FeaturedClub::new("Broken", "NOHASH"));

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = AppConfig::default();
        config.api.base_url = "not a url".to_string();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brawl-insight.toml");
        std::fs::write(
            &path,
            r##"
log_level = "debug"

[api]
cache_ttl_seconds = 60
cache_dir = "/tmp/brawl-cache"

[ai]
enabled = false

[[clubs]]
name = "Only"
tag = "#2YJQ8LRCG"
"##,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.api.cache_ttl_seconds, 60);
        assert_eq!(config.api.cache_dir, Some(PathBuf::from("/tmp/brawl-cache")));
        assert_eq!(config.api.timeout_seconds, 10);
        assert!(!config.ai.enabled);
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.clubs, vec![FeaturedClub::new("Only", "#2YJQ8LRCG")]);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[server]\nport = 0\n").unwrap();

        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ValidationError(_))
        ));

        std::fs::write(&path, "this is = = not toml").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.clubs, parsed.clubs);
    }

    #[test]
    fn test_secrets_lookup() {
        let env: HashMap<&str, &str> = HashMap::from([
            (GAME_API_KEY_VAR, " game-key "),
            (AI_API_KEY_VAR, "ai-key"),
        ]);
        let secrets = Secrets::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(secrets.game_api_key, "game-key");
        assert_eq!(secrets.ai_api_key, "ai-key");
        assert!(!format!("{:?}", secrets).contains("game-key"));
    }

    #[test]
    fn test_secrets_missing_or_empty() {
        let err = Secrets::from_lookup(|_| None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret(GAME_API_KEY_VAR)));

        let err = Secrets::from_lookup(|k| {
            (k == GAME_API_KEY_VAR).then(|| "key".to_string()).or(Some(String::new()))
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSecret(AI_API_KEY_VAR)));
    }
}
