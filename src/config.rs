//! Configuration module for filenest.

use serde::Deserialize;
use std::path::Path;

use crate::{FilenestError, Result};

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/filenest.db".to_string()
}

fn default_max_connections() -> u32 {
    8
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Upload limits.
#[derive(Debug, Clone, Deserialize)]
pub struct FilesConfig {
    /// Maximum upload size in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
}

fn default_max_upload_size() -> u64 {
    10
}

impl FilesConfig {
    /// Maximum upload size in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: default_max_upload_size(),
        }
    }
}

/// Which blob store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BlobBackend {
    /// Sharded directory on the local disk.
    #[default]
    Local,
    /// Cloudinary upload API.
    Cloudinary,
}

/// Blob storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BlobConfig {
    /// Selected backend.
    #[serde(default)]
    pub backend: BlobBackend,
    /// Directory for the local backend.
    #[serde(default = "default_local_path")]
    pub local_path: String,
    /// Base URL under which local blobs are published.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Cloudinary cloud name.
    #[serde(default)]
    pub cloud_name: String,
    /// Cloudinary API key.
    #[serde(default)]
    pub api_key: String,
    /// Cloudinary API secret.
    #[serde(default)]
    pub api_secret: String,
    /// Remote folder uploads are placed in.
    #[serde(default = "default_remote_folder")]
    pub folder: String,
    /// Upload API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Delivery base URL for download links.
    #[serde(default = "default_delivery_base_url")]
    pub delivery_base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_blob_timeout")]
    pub timeout_secs: u64,
}

fn default_local_path() -> String {
    "data/blobs".to_string()
}

fn default_public_url() -> String {
    "/blobs".to_string()
}

fn default_remote_folder() -> String {
    "homepage".to_string()
}

fn default_api_base_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_delivery_base_url() -> String {
    "https://res.cloudinary.com".to_string()
}

fn default_blob_timeout() -> u64 {
    30
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: BlobBackend::default(),
            local_path: default_local_path(),
            public_url: default_public_url(),
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            folder: default_remote_folder(),
            api_base_url: default_api_base_url(),
            delivery_base_url: default_delivery_base_url(),
            timeout_secs: default_blob_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file. Empty disables file logging.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/filenest.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Secret mixed into stored session token hashes (must be set).
    #[serde(default)]
    pub session_secret: String,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub session_cookie_name: String,
    /// Session lifetime in hours.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u64,
    /// Interval between expired-session sweeps.
    #[serde(default = "default_cleanup_interval")]
    pub session_cleanup_interval_secs: u64,
    /// Mark the session cookie `Secure`.
    #[serde(default)]
    pub secure_cookies: bool,
    /// How many ancestor levels the breadcrumb trail shows (unset = all).
    #[serde(default)]
    pub breadcrumb_levels: Option<usize>,
}

fn default_cookie_name() -> String {
    "filenest_sid".to_string()
}

fn default_session_ttl() -> u64 {
    24 * 7
}

fn default_cleanup_interval() -> u64 {
    120
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: vec![],
            session_secret: String::new(),
            session_cookie_name: default_cookie_name(),
            session_ttl_hours: default_session_ttl(),
            session_cleanup_interval_secs: default_cleanup_interval(),
            secure_cookies: false,
            breadcrumb_levels: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Listener configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Upload limits.
    #[serde(default)]
    pub files: FilesConfig,
    /// Blob storage.
    #[serde(default)]
    pub blob: BlobConfig,
    /// Web configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FilenestError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FilenestError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FILENEST_SESSION_SECRET`
    /// - `FILENEST_DATABASE_URL`
    /// - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_API_KEY`, `CLOUDINARY_API_SECRET`
    ///   (all three switch the blob backend to Cloudinary)
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = non_empty_env("FILENEST_SESSION_SECRET") {
            self.web.session_secret = secret;
        }
        if let Some(path) = non_empty_env("FILENEST_DATABASE_URL") {
            self.database.path = path;
        }

        let cloud = (
            non_empty_env("CLOUDINARY_CLOUD_NAME"),
            non_empty_env("CLOUDINARY_API_KEY"),
            non_empty_env("CLOUDINARY_API_SECRET"),
        );
        if let (Some(cloud_name), Some(api_key), Some(api_secret)) = cloud {
            self.blob.backend = BlobBackend::Cloudinary;
            self.blob.cloud_name = cloud_name;
            self.blob.api_key = api_key;
            self.blob.api_secret = api_secret;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.web.session_secret.is_empty() {
            return Err(FilenestError::Config(
                "session_secret is not set. \
                 Set it in config.toml or via FILENEST_SESSION_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.blob.backend == BlobBackend::Cloudinary
            && (self.blob.cloud_name.is_empty()
                || self.blob.api_key.is_empty()
                || self.blob.api_secret.is_empty())
        {
            return Err(FilenestError::Config(
                "cloudinary backend requires cloud_name, api_key and api_secret".to_string(),
            ));
        }
        if self.files.max_upload_size_mb == 0 {
            return Err(FilenestError::Config(
                "max_upload_size_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
