//! Configuration management
//!
//! Configuration for the Webform service is loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Active profiles
    #[serde(default)]
    pub profiles: ProfilesConfig,
    /// Startup seeding
    #[serde(default)]
    pub seed: SeedConfig,
    /// Form session settings
    #[serde(default)]
    pub forms: FormsConfig,
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
    /// Directory holding the browser form bundles
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

/// Database configuration (SQLite)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database file path or `sqlite:` URL, `:memory:` for a transient database
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "data/webform.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

/// Active configuration profiles, e.g. `dev` or `production-east`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub active: Vec<String>,
}

/// Reference data seeding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Number of subtypes created for every blog type
    #[serde(default = "default_subtypes_per_type")]
    pub subtypes_per_type: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            subtypes_per_type: default_subtypes_per_type(),
        }
    }
}

fn default_subtypes_per_type() -> usize {
    300
}

/// Form session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormsConfig {
    /// How long an idle form session stays resumable
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
    /// Maximum number of live form sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,
    /// Upper bound on choices offered for a reference member
    #[serde(default = "default_max_choices")]
    pub max_choices: usize,
}

impl Default for FormsConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: default_session_ttl(),
            max_sessions: default_max_sessions(),
            max_choices: default_max_choices(),
        }
    }
}

fn default_session_ttl() -> u64 {
    1800
}

fn default_max_sessions() -> u64 {
    10_000
}

fn default_max_choices() -> usize {
    1000
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
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist or is empty, returns default configuration.
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
    /// - WEBFORM_SERVER_HOST
    /// - WEBFORM_SERVER_PORT
    /// - WEBFORM_SERVER_STATIC_DIR
    /// - WEBFORM_DATABASE_URL
    /// - WEBFORM_DATABASE_MAX_CONNECTIONS
    /// - WEBFORM_PROFILES_ACTIVE (comma separated)
    /// - WEBFORM_SEED_SUBTYPES_PER_TYPE
    /// - WEBFORM_FORMS_SESSION_TTL_SECONDS
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to the configuration.
    /// Values that fail to parse are ignored.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("WEBFORM_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("WEBFORM_SERVER_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(dir) = std::env::var("WEBFORM_SERVER_STATIC_DIR") {
            self.server.static_dir = PathBuf::from(dir);
        }

        if let Ok(url) = std::env::var("WEBFORM_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(max) = std::env::var("WEBFORM_DATABASE_MAX_CONNECTIONS") {
            if let Ok(max) = max.parse::<u32>() {
                self.database.max_connections = max;
            }
        }

        if let Ok(profiles) = std::env::var("WEBFORM_PROFILES_ACTIVE") {
            self.profiles.active = parse_profile_list(&profiles);
        }

        if let Ok(count) = std::env::var("WEBFORM_SEED_SUBTYPES_PER_TYPE") {
            if let Ok(count) = count.parse::<usize>() {
                self.seed.subtypes_per_type = count;
            }
        }

        if let Ok(ttl) = std::env::var("WEBFORM_FORMS_SESSION_TTL_SECONDS") {
            if let Ok(ttl) = ttl.parse::<u64>() {
                self.forms.session_ttl_seconds = ttl;
            }
        }
    }
}

/// Split a comma separated profile list, dropping blanks
pub fn parse_profile_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
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
