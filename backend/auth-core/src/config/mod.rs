//! Service configuration.
//!
//! Loaded from `{config_dir}/auth.toml`, then overridden by environment
//! variables (optionally sourced from a `.env` file). A missing file means
//! defaults; a file that exists but does not parse or validate is an error.

use crate::error::config::ConfigError;

use common::{ErrorLocation, RedactedSecret};

use std::env;
use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Deserializer};

const CONFIG_FILE_NAME: &str = "auth.toml";

pub const ENV_SOCKET_ENABLED: &str = "AUTH_SOCKET_ENABLED";
pub const ENV_SOCKET_HOST: &str = "AUTH_SOCKET_HOST";
pub const ENV_SOCKET_PORT: &str = "AUTH_SOCKET_PORT";
pub const ENV_SOCKET_TIMEOUT_MS: &str = "AUTH_SOCKET_TIMEOUT_MS";
pub const ENV_DEMO_USERNAME: &str = "AUTH_DEMO_USERNAME";
pub const ENV_DEMO_PASSWORD: &str = "AUTH_DEMO_PASSWORD";
pub const ENV_HTTP_PORT: &str = "AUTH_HTTP_PORT";

// ============================================
// CONFIG STRUCTS
// ============================================

/// Protocol server / client settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SocketConfig {
    /// Master switch. When false the protocol server never binds.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_socket_host")]
    pub host: String,
    #[serde(default = "default_socket_port")]
    pub port: u16,
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_socket_host(),
            port: default_socket_port(),
            connect_timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
        }
    }
}

impl SocketConfig {
    /// `host:port` as used for both bind and connect.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// HTTP gate settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GateConfig {
    #[serde(default = "default_header_token")]
    pub header_token: String,
    #[serde(default = "default_header_username")]
    pub header_username: String,
    #[serde(default = "default_header_password")]
    pub header_password: String,
    /// Requests under this prefix require a token. Empty disables gating.
    #[serde(default = "default_protected_path_prefix")]
    pub protected_path_prefix: String,
    #[serde(default = "default_exempt_path_prefixes")]
    pub exempt_path_prefixes: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            header_token: default_header_token(),
            header_username: default_header_username(),
            header_password: default_header_password(),
            protected_path_prefix: default_protected_path_prefix(),
            exempt_path_prefixes: default_exempt_path_prefixes(),
        }
    }
}

/// The fixed username/password pair accepted in demo mode.
#[derive(Debug, Clone, Deserialize)]
pub struct DemoCredentialsConfig {
    #[serde(default = "default_demo_username")]
    pub username: String,
    #[serde(
        default = "default_demo_password",
        deserialize_with = "deserialize_secret"
    )]
    pub password: RedactedSecret,
}

impl Default for DemoCredentialsConfig {
    fn default() -> Self {
        Self {
            username: default_demo_username(),
            password: default_demo_password(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    #[serde(default = "default_http_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

impl HttpConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub socket: SocketConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub demo: DemoCredentialsConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_enabled() -> bool {
    true
}
fn default_socket_host() -> String {
    "127.0.0.1".to_string()
}
fn default_socket_port() -> u16 {
    9090
}
fn default_timeout_ms() -> u64 {
    2000
}
fn default_header_token() -> String {
    "X-Auth-Token".to_string()
}
fn default_header_username() -> String {
    "X-Username".to_string()
}
fn default_header_password() -> String {
    "X-Password".to_string()
}
fn default_protected_path_prefix() -> String {
    "/quad".to_string()
}
fn default_exempt_path_prefixes() -> Vec<String> {
    vec![
        "/auth/".to_string(),
        "/actuator/".to_string(),
        "/error".to_string(),
    ]
}
fn default_demo_username() -> String {
    "admin".to_string()
}
fn default_demo_password() -> RedactedSecret {
    RedactedSecret::new("password123")
}
fn default_http_host() -> String {
    "127.0.0.1".to_string()
}
fn default_http_port() -> u16 {
    8080
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<RedactedSecret, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(RedactedSecret::new)
}

// ============================================
// IMPLEMENTATION
// ============================================

impl AuthConfig {
    /// Load `{config_dir}/auth.toml` and apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file exists but cannot be read or parsed,
    /// if an override variable holds an unparseable value, or if the resulting
    /// configuration fails [`AuthConfig::validate`].
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(config_dir)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load only the TOML file (no environment overrides, no validation).
    pub fn load_file(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file {}: {}", config_path.display(), e);
            ConfigError::ReadError {
                location: ErrorLocation::caller(),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: AuthConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config TOML {}: {}", config_path.display(), e);
            ConfigError::ParseError {
                location: ErrorLocation::caller(),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Apply `AUTH_*` environment variables on top of the file values.
    ///
    /// A `.env` in the working directory is sourced first when present.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => info!("Loaded .env from: {}", path.display()),
            Err(_) => debug!("No .env file found - using process environment only"),
        }

        if let Some(value) = read_env(ENV_SOCKET_ENABLED)? {
            self.socket.enabled = parse_env(ENV_SOCKET_ENABLED, &value)?;
        }
        if let Some(value) = read_env(ENV_SOCKET_HOST)? {
            self.socket.host = value;
        }
        if let Some(value) = read_env(ENV_SOCKET_PORT)? {
            self.socket.port = parse_env(ENV_SOCKET_PORT, &value)?;
        }
        if let Some(value) = read_env(ENV_SOCKET_TIMEOUT_MS)? {
            let timeout_ms: u64 = parse_env(ENV_SOCKET_TIMEOUT_MS, &value)?;
            self.socket.connect_timeout_ms = timeout_ms;
            self.socket.read_timeout_ms = timeout_ms;
        }
        if let Some(value) = read_env(ENV_DEMO_USERNAME)? {
            self.demo.username = value;
        }
        if let Some(value) = read_env(ENV_DEMO_PASSWORD)? {
            self.demo.password = RedactedSecret::new(value);
        }
        if let Some(value) = read_env(ENV_HTTP_PORT)? {
            self.http.port = parse_env(ENV_HTTP_PORT, &value)?;
        }

        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.socket.host.trim().is_empty() {
            return Err(ConfigError::validation("socket.host cannot be empty"));
        }

        if self.socket.connect_timeout_ms == 0 || self.socket.read_timeout_ms == 0 {
            return Err(ConfigError::validation(format!(
                "socket timeouts must be > 0 (connect={}ms, read={}ms)",
                self.socket.connect_timeout_ms, self.socket.read_timeout_ms
            )));
        }

        for (name, value) in [
            ("gate.header_token", &self.gate.header_token),
            ("gate.header_username", &self.gate.header_username),
            ("gate.header_password", &self.gate.header_password),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::validation(format!("{name} cannot be empty")));
            }
        }

        let prefix = &self.gate.protected_path_prefix;
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err(ConfigError::validation(format!(
                "gate.protected_path_prefix must start with '/': {prefix}"
            )));
        }

        if self.demo.username.is_empty() {
            return Err(ConfigError::validation("demo.username cannot be empty"));
        }

        if self.http.host.trim().is_empty() {
            return Err(ConfigError::validation("http.host cannot be empty"));
        }

        Ok(())
    }
}

#[track_caller]
fn read_env(variable: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(variable) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => {
            Err(ConfigError::env(variable, "contains invalid unicode"))
        }
    }
}

#[track_caller]
fn parse_env<T>(variable: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::env(variable, format!("'{value}': {e}")))
}
