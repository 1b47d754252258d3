//! Shared configuration for the boardstack CLI.
//!
//! TOML file + `BOARDSTACK_*` environment layered over defaults, keyring
//! credential storage, and translation to `boardstack_core::ClientConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use boardstack_api::{AUTH_TOKEN_KEY, CredentialStore, DEFAULT_BASE_URL, DEFAULT_LOGIN_PATH};
use boardstack_core::ClientConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "BOARDSTACK_CONFIG";

/// Environment variable supplying a bearer token, bypassing the keyring.
pub const TOKEN_ENV: &str = "BOARDSTACK_TOKEN";

/// Keyring service name the token entry lives under.
pub const KEYRING_SERVICE: &str = "boardstack";

const ENV_PREFIX: &str = "BOARDSTACK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration. Every key can also be set through the
/// environment, e.g. `BOARDSTACK_API_BASE_URL`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Backend base URL, including the `/api` prefix.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Login boundary a 401 redirects to.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    #[serde(default = "default_list_stale_secs")]
    pub list_stale_secs: u64,

    /// Zero means detail reads always refetch.
    #[serde(default)]
    pub detail_stale_secs: u64,

    #[serde(default = "default_notification_ttl_secs")]
    pub notification_ttl_secs: u64,

    #[serde(default = "default_dashboard_refresh_secs")]
    pub dashboard_refresh_secs: u64,

    /// Default output format: table, json, json-compact, yaml or plain.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            timeout_secs: default_timeout_secs(),
            login_path: default_login_path(),
            list_stale_secs: default_list_stale_secs(),
            detail_stale_secs: 0,
            notification_ttl_secs: default_notification_ttl_secs(),
            dashboard_refresh_secs: default_dashboard_refresh_secs(),
            output: default_output(),
        }
    }
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_login_path() -> String {
    DEFAULT_LOGIN_PATH.into()
}
fn default_list_stale_secs() -> u64 {
    300
}
fn default_notification_ttl_secs() -> u64 {
    5
}
fn default_dashboard_refresh_secs() -> u64 {
    30
}
fn default_output() -> String {
    "table".into()
}

impl Config {
    /// Validate and translate into the runtime client configuration.
    pub fn to_client_config(&self) -> Result<ClientConfig, ConfigError> {
        let base_url: url::Url = self
            .api_base_url
            .parse()
            .map_err(|_| validation("api_base_url", format!("invalid URL: {}", self.api_base_url)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(validation(
                "api_base_url",
                format!("expected an http(s) URL, got '{}'", base_url.scheme()),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(validation("timeout_secs", "must be greater than zero"));
        }
        if !self.login_path.starts_with('/') {
            return Err(validation("login_path", "must start with '/'"));
        }
        if self.dashboard_refresh_secs == 0 {
            return Err(validation("dashboard_refresh_secs", "must be greater than zero"));
        }

        Ok(ClientConfig {
            base_url,
            timeout: Duration::from_secs(self.timeout_secs),
            login_path: self.login_path.clone(),
            list_stale_after: Duration::from_secs(self.list_stale_secs),
            detail_stale_after: Duration::from_secs(self.detail_stale_secs),
            notification_ttl: Duration::from_secs(self.notification_ttl_secs),
            dashboard_refresh: Duration::from_secs(self.dashboard_refresh_secs),
        })
    }
}

fn validation(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `BOARDSTACK_CONFIG`, then platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "boardstack", "boardstack").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("boardstack");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then `BOARDSTACK_*`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, falling back to defaults on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// The file at `path` alone, without environment overrides. A missing
/// file yields defaults.
pub fn load_file_or_default(path: &Path) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

// ── Config saving ───────────────────────────────────────────────────

pub fn to_toml_string(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = to_toml_string(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

// ── Keyring credential store ────────────────────────────────────────

/// Bearer-token storage in the OS keyring (`boardstack` / `authToken`).
///
/// `BOARDSTACK_TOKEN`, when set, takes precedence for reads and is never
/// written back.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(&self.service, AUTH_TOKEN_KEY)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

fn credential_error(err: &keyring::Error) -> boardstack_api::Error {
    boardstack_api::Error::Credential(err.to_string())
}

impl CredentialStore for KeyringCredentialStore {
    fn token(&self) -> Option<SecretString> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                return Some(SecretString::from(token));
            }
        }
        self.entry()
            .and_then(|entry| entry.get_password())
            .ok()
            .map(SecretString::from)
    }

    fn store(&self, token: SecretString) -> Result<(), boardstack_api::Error> {
        self.entry()
            .and_then(|entry| entry.set_password(token.expose_secret()))
            .map_err(|e| credential_error(&e))
    }

    fn clear(&self) -> Result<(), boardstack_api::Error> {
        match self.entry().and_then(|entry| entry.delete_credential()) {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(credential_error(&e)),
        }
    }
}
