//! Configuration management
//!
//! This module handles loading and parsing configuration for the gallery backend.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults. The resulting
//! `Config` is built once at startup and shared read-only afterwards.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Minimum length of a configured session signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime, in hours (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Auth configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Startup data seeding
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API with credentials
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5500".to_string()]
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/gallery.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

impl std::str::FromStr for DatabaseDriver {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "mysql" => Ok(Self::Mysql),
            other => Err(ConfigError::ValidationError(format!(
                "Unknown database driver: {}",
                other
            ))),
        }
    }
}

/// Session and cookie configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC key used to sign session tokens. Generated at startup when unset.
    #[serde(default)]
    pub session_secret: Option<String>,
    /// Session lifetime in hours
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
    /// Name of the session cookie
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Add the `Secure` attribute to the session cookie
    #[serde(default)]
    pub cookie_secure: bool,
    /// Where the browser goes after a successful login
    #[serde(default = "default_login_redirect")]
    pub login_redirect: String,
    /// How often expired revocation entries are purged, in minutes
    #[serde(default = "default_revocation_cleanup_minutes")]
    pub revocation_cleanup_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: None,
            session_ttl_hours: default_session_ttl_hours(),
            cookie_name: default_cookie_name(),
            cookie_secure: false,
            login_redirect: default_login_redirect(),
            revocation_cleanup_minutes: default_revocation_cleanup_minutes(),
        }
    }
}

fn default_session_ttl_hours() -> i64 {
    24
}

fn default_cookie_name() -> String {
    "session".to_string()
}

fn default_login_redirect() -> String {
    "/frontend/src/dashboard.html".to_string()
}

fn default_revocation_cleanup_minutes() -> u64 {
    10
}

impl AuthConfig {
    /// Key material for the session signer.
    ///
    /// Falls back to a random per-process key when no secret is configured;
    /// sessions then do not survive a restart.
    pub fn signing_secret(&self) -> Vec<u8> {
        match &self.session_secret {
            Some(secret) if !secret.is_empty() => secret.as_bytes().to_vec(),
            _ => {
                tracing::warn!(
                    "No session secret configured; generating an ephemeral one (sessions end on restart)"
                );
                let mut key = vec![0u8; MIN_SECRET_LEN];
                OsRng.fill_bytes(&mut key);
                key
            }
        }
    }

    /// Session lifetime
    ///
    /// Values above `MAX_SESSION_TTL_HOURS` are clamped; `validate` rejects them.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.session_ttl_hours.min(MAX_SESSION_TTL_HOURS))
            .unwrap_or_else(chrono::Duration::zero)
    }
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded images are written to (also served statically)
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// URL prefix under which `path` is served
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Maximum file size in bytes (default: 5MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Allowed image MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            public_prefix: default_public_prefix(),
            max_file_size: default_max_file_size(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("assets/images")
}

fn default_public_prefix() -> String {
    "/assets/images".to_string()
}

fn default_max_file_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_allowed_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/gif".to_string(),
        "image/webp".to_string(),
    ]
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }
}

/// Data inserted at startup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// JSON file with an array of artworks, loaded when the table is empty
    #[serde(default)]
    pub artworks_file: Option<PathBuf>,
    /// Bootstrap administrator account
    #[serde(default)]
    pub admin: Option<AdminSeed>,
}

/// Bootstrap administrator credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - GALLERY_SERVER_HOST
    /// - GALLERY_SERVER_PORT
    /// - GALLERY_SERVER_CORS_ORIGINS (comma separated)
    /// - GALLERY_DATABASE_DRIVER
    /// - GALLERY_DATABASE_URL
    /// - GALLERY_AUTH_SESSION_SECRET
    /// - GALLERY_AUTH_SESSION_TTL_HOURS
    /// - GALLERY_AUTH_COOKIE_SECURE
    /// - GALLERY_UPLOAD_PATH
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(host) = env_value::<String>("GALLERY_SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_value("GALLERY_SERVER_PORT") {
            self.server.port = port;
        }
        if let Some(origins) = env_value::<String>("GALLERY_SERVER_CORS_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
            if !origins.is_empty() {
                self.server.cors_origins = origins;
            }
        }

        if let Some(driver) = env_value("GALLERY_DATABASE_DRIVER") {
            self.database.driver = driver;
        }
        if let Some(url) = env_value("GALLERY_DATABASE_URL") {
            self.database.url = url;
        }

        if let Some(secret) = env_value("GALLERY_AUTH_SESSION_SECRET") {
            self.auth.session_secret = Some(secret);
        }
        if let Some(ttl) = env_value("GALLERY_AUTH_SESSION_TTL_HOURS") {
            self.auth.session_ttl_hours = ttl;
        }
        if let Some(secure) = env_value("GALLERY_AUTH_COOKIE_SECURE") {
            self.auth.cookie_secure = secure;
        }

        if let Some(path) = env_value("GALLERY_UPLOAD_PATH") {
            self.upload.path = path;
        }
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::ValidationError("server.port must not be 0".into()));
        }
        if self.server.cors_origins.is_empty() {
            return Err(ConfigError::ValidationError(
                "server.cors_origins must list at least one origin".into(),
            ));
        }
        for origin in &self.server.cors_origins {
            if axum::http::HeaderValue::from_str(origin).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid CORS origin: {}",
                    origin
                )));
            }
        }
        if let Some(secret) = &self.auth.session_secret {
            if !secret.is_empty() && secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::ValidationError(format!(
                    "auth.session_secret must be at least {} bytes",
                    MIN_SECRET_LEN
                )));
            }
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::ValidationError(
                "auth.session_ttl_hours must be positive".into(),
            ));
        }
        if self.auth.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(ConfigError::ValidationError(format!(
                "auth.session_ttl_hours must be at most {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        if self.auth.cookie_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "auth.cookie_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Parsed value of an environment variable; unset or unparsable reads as `None`
fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}", key);
            None
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
