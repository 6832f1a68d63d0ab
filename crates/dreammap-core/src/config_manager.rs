use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config: {0}")]
    ReadError(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration for DreamMap
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DreamMapConfig {
    /// Text-generation backend used for dream analysis
    #[serde(default)]
    pub llm: LlmConfig,

    /// Astronomy service used for the moon phase lookup
    #[serde(default)]
    pub moon: MoonConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Where completed records are kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM configuration for dream analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Ollama URL
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Model identifier (e.g., "gpt-oss:20b")
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation. Kept low to reduce variance in the JSON shape.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Astronomy API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoonConfig {
    /// Base URL of the astronomy API
    #[serde(default = "default_moon_base_url")]
    pub base_url: String,

    /// Access key (MOON_ACCESS_KEY)
    #[serde(default)]
    pub access_key: Option<String>,

    /// Secret key (MOON_SECRET_KEY)
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Place used when a request carries no location
    #[serde(default = "default_place_id")]
    pub default_place_id: String,

    /// Request timeout in seconds
    #[serde(default = "default_moon_timeout_secs")]
    pub timeout_secs: u64,
}

impl MoonConfig {
    pub fn has_credentials(&self) -> bool {
        matches!(
            (&self.access_key, &self.secret_key),
            (Some(a), Some(s)) if !a.is_empty() && !s.is_empty()
        )
    }
}

impl Default for MoonConfig {
    fn default() -> Self {
        Self {
            base_url: default_moon_base_url(),
            access_key: None,
            secret_key: None,
            default_place_id: default_place_id(),
            timeout_secs: default_moon_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Record storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON file holding saved dreams. In-memory only when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "pretty", "compact"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_model() -> String {
    "gpt-oss:20b".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_llm_timeout_secs() -> u64 {
    120
}
fn default_moon_base_url() -> String {
    "https://api.xmltime.com".to_string()
}
fn default_place_id() -> String {
    "norway/oslo".to_string()
}
fn default_moon_timeout_secs() -> u64 {
    10
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

/// Configuration manager with layered sources
pub struct ConfigManager {
    config: DreamMapConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with the following precedence:
    /// 1. Environment variables (.env file)
    /// 2. Config file (.dreammap.toml)
    /// 3. Sensible defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_dotenv();
        let (config, config_path) = Self::load_config_file()?;
        Self::finish(config, config_path)
    }

    /// Load from an explicit config file instead of the search path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::load_dotenv();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let config = Self::read_toml_file(path)?;
        Self::finish(config, Some(path.to_path_buf()))
    }

    /// Wrap an already-built configuration, skipping files and environment.
    pub fn from_config(config: DreamMapConfig) -> Result<Self, ConfigError> {
        Self::validate_config(&config)?;
        Ok(Self {
            config,
            config_path: None,
        })
    }

    fn finish(
        config: DreamMapConfig,
        config_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config = Self::apply_env_overrides(config);
        Self::validate_config(&config)?;

        info!("Configuration loaded");
        match config_path {
            Some(ref path) => info!(path = %path.display(), "Using config file"),
            None => info!("No config file found, using defaults"),
        }
        info!(
            ollama_url = %config.llm.ollama_url,
            model = %config.llm.model,
            temperature = config.llm.temperature,
            "LLM backend"
        );
        if !config.moon.has_credentials() {
            warn!("MOON_ACCESS_KEY or MOON_SECRET_KEY not set; moon phases will be reported as unknown");
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Load .env file if it exists
    fn load_dotenv() {
        if Path::new(".env").exists() {
            if let Err(e) = dotenv::from_filename(".env") {
                warn!("Failed to load .env file: {}", e);
            } else {
                info!("Loaded .env file from current directory");
            }
            return;
        }

        if let Some(home) = dirs::home_dir() {
            let home_env = home.join(".dreammap.env");
            if home_env.exists() {
                if let Err(e) = dotenv::from_path(&home_env) {
                    warn!("Failed to load .dreammap.env: {}", e);
                } else {
                    info!("Loaded .dreammap.env from home directory");
                }
            }
        }
    }

    /// Find and load config file
    /// Search order:
    /// 1. ./.dreammap.toml (current directory)
    /// 2. ~/.dreammap/config.toml (user config)
    /// 3. Use defaults
    fn load_config_file() -> Result<(DreamMapConfig, Option<PathBuf>), ConfigError> {
        let local_config = Path::new(".dreammap.toml");
        if local_config.exists() {
            let config = Self::read_toml_file(local_config)?;
            return Ok((config, Some(local_config.to_path_buf())));
        }

        if let Some(user_config) = Self::user_config_path() {
            if user_config.exists() {
                let config = Self::read_toml_file(&user_config)?;
                return Ok((config, Some(user_config)));
            }
        }

        Ok((DreamMapConfig::default(), None))
    }

    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".dreammap").join("config.toml"))
    }

    fn read_toml_file(path: &Path) -> Result<DreamMapConfig, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: DreamMapConfig) -> DreamMapConfig {
        // LLM configuration
        if let Ok(url) = std::env::var("DREAMMAP_OLLAMA_URL") {
            config.llm.ollama_url = url;
        }
        if let Ok(model) = std::env::var("DREAMMAP_MODEL") {
            config.llm.model = model;
        }
        if let Ok(temp) = std::env::var("DREAMMAP_TEMPERATURE") {
            if let Ok(t) = temp.parse() {
                config.llm.temperature = t;
            }
        }
        if let Ok(timeout) = std::env::var("DREAMMAP_LLM_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.llm.timeout_secs = secs;
            }
        }

        // Moon configuration
        if let Ok(key) = std::env::var("MOON_ACCESS_KEY") {
            config.moon.access_key = Some(key);
        }
        if let Ok(key) = std::env::var("MOON_SECRET_KEY") {
            config.moon.secret_key = Some(key);
        }
        if let Ok(url) = std::env::var("DREAMMAP_MOON_URL") {
            config.moon.base_url = url;
        }
        if let Ok(place) = std::env::var("DREAMMAP_DEFAULT_PLACE") {
            config.moon.default_place_id = place;
        }
        if let Ok(timeout) = std::env::var("DREAMMAP_MOON_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.moon.timeout_secs = secs;
            }
        }

        // Server and storage
        if let Ok(host) = std::env::var("DREAMMAP_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("DREAMMAP_PORT") {
            if let Ok(p) = port.parse() {
                config.server.port = p;
            }
        }
        if let Ok(path) = std::env::var("DREAMMAP_STORE_PATH") {
            config.storage.path = Some(PathBuf::from(path));
        }

        // Logging
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }

        config
    }

    /// Validate configuration
    fn validate_config(config: &DreamMapConfig) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&config.llm.temperature) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid temperature: {}. Must be between 0.0 and 2.0",
                config.llm.temperature
            )));
        }

        if config.llm.timeout_secs == 0 || config.moon.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "Timeouts must be at least one second".to_string(),
            ));
        }

        if config.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "LLM model must not be empty".to_string(),
            ));
        }

        match config.logging.format.as_str() {
            "pretty" | "compact" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {}. Must be one of: pretty, compact",
                    other
                )))
            }
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &DreamMapConfig {
        &self.config
    }

    /// Get the path to the config file that was loaded, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Create a default config file
    pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        let config = DreamMapConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ReadError(e.to_string()))?;
        }

        std::fs::write(path, toml_str).map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Ok(())
    }
}
