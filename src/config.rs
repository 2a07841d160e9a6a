//! Configuration management for ragsync
//!
//! Configuration is layered: YAML file (or defaults when the file is
//! missing), then `RAGSYNC_*` environment variables, then CLI flags.
//! [`Config::validate`] runs last.

use crate::error::{Result, RagSyncError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Main configuration structure for ragsync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// RAG service endpoints
    #[serde(default)]
    pub server: ServerConfig,
    /// Live progress stream behaviour
    #[serde(default)]
    pub live: LiveConfig,
    /// Session identity policy
    #[serde(default)]
    pub session: SessionConfig,
    /// Local state storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Document upload limits
    #[serde(default)]
    pub upload: UploadConfig,
    /// Logging output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// RAG service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the HTTP API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Page origin the WebSocket endpoint is derived from.
    ///
    /// Defaults to the API base URL.
    #[serde(default)]
    pub page_url: Option<String>,

    /// Explicit WebSocket base, replacing scheme and host of the derived one
    #[serde(default)]
    pub ws_base_url: Option<String>,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

fn default_api_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            page_url: None,
            ws_base_url: None,
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

/// Live progress stream configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Wait between an unexpected disconnect and the next attempt
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

/// Session identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Inactivity after which the stored session is discarded
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: i64,
}

fn default_ttl_ms() -> i64 {
    crate::session::DEFAULT_SESSION_TTL_MS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
        }
    }
}

/// Local state storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database directory; the platform data directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_max_upload_bytes() -> u64 {
    crate::api::DEFAULT_MAX_UPLOAD_BYTES
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json_format: bool,

    /// Also append log output to this file
    #[serde(default)]
    pub file_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagSyncError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| RagSyncError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_url) = std::env::var("RAGSYNC_API_URL") {
            self.server.api_base_url = api_url;
        }

        if let Ok(page_url) = std::env::var("RAGSYNC_PAGE_URL") {
            self.server.page_url = Some(page_url);
        }

        if let Ok(ws_url) = std::env::var("RAGSYNC_WS_URL") {
            self.server.ws_base_url = Some(ws_url);
        }

        if let Ok(delay) = std::env::var("RAGSYNC_RECONNECT_DELAY_MS") {
            if let Ok(value) = delay.parse() {
                self.live.reconnect_delay_ms = value;
            } else {
                tracing::warn!("Invalid RAGSYNC_RECONNECT_DELAY_MS: {}", delay);
            }
        }

        if let Ok(store_path) = std::env::var("RAGSYNC_STORE_PATH") {
            self.storage.path = Some(PathBuf::from(store_path));
        }

        if let Ok(level) = std::env::var("RAGSYNC_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(store) = &cli.store {
            self.storage.path = Some(store.clone());
        }

        if cli.verbose {
            self.logging.level = "debug".to_string();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `RagSyncError::Config` naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        self.api_base_url()?;
        self.page_url()?;
        self.ws_base_url()?;

        if self.server.request_timeout_seconds == 0 {
            return Err(RagSyncError::Config(
                "server.request_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.live.reconnect_delay_ms == 0 {
            return Err(RagSyncError::Config(
                "live.reconnect_delay_ms must be greater than 0".to_string(),
            )
            .into());
        }

        if self.session.ttl_ms <= 0 {
            return Err(
                RagSyncError::Config("session.ttl_ms must be greater than 0".to_string()).into(),
            );
        }

        if self.upload.max_upload_bytes == 0 {
            return Err(RagSyncError::Config(
                "upload.max_upload_bytes must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// Parsed API base URL
    pub fn api_base_url(&self) -> Result<Url> {
        parse_url("server.api_base_url", &self.server.api_base_url, &["http", "https"])
    }

    /// Parsed page URL, falling back to the API base URL
    pub fn page_url(&self) -> Result<Url> {
        match &self.server.page_url {
            Some(page) => parse_url("server.page_url", page, &["http", "https"]),
            None => self.api_base_url(),
        }
    }

    /// Parsed WebSocket base override, if configured
    pub fn ws_base_url(&self) -> Result<Option<Url>> {
        self.server
            .ws_base_url
            .as_deref()
            .map(|ws| parse_url("server.ws_base_url", ws, &["ws", "wss", "http", "https"]))
            .transpose()
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    /// Live stream reconnect delay
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.live.reconnect_delay_ms)
    }
}

fn parse_url(field: &str, raw: &str, schemes: &[&str]) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| RagSyncError::Config(format!("{} is not a valid URL ({}): {}", field, raw, e)))?;
    if !schemes.contains(&url.scheme()) {
        return Err(RagSyncError::Config(format!(
            "{} must use one of: {} (got {})",
            field,
            schemes.join(", "),
            url.scheme()
        ))
        .into());
    }
    Ok(url)
}
