//! Shared configuration for the gatehouse binary and web server.
//!
//! TOML settings layered with `GATEHOUSE_` environment overrides, and
//! translation to `gatehouse_core::Settings`.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use gatehouse_core::{DEFAULT_THEMES, PasswordPolicy, ReservedNames, Settings};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

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

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub web: WebConfig,

    #[serde(default)]
    pub accounts: AccountsConfig,

    /// Output defaults for the CLI.
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub cli: CliConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Configuration store file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Request header carrying the username authenticated by the front proxy.
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            user_header: default_user_header(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8080".into()
}
fn default_user_header() -> String {
    "x-remote-user".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AccountsConfig {
    /// Host account database whose names may not be reused.
    #[serde(default = "default_passwd_file")]
    pub passwd_file: PathBuf,

    #[serde(default)]
    pub password_policy: PasswordPolicy,

    /// Console theme files operators may choose from.
    #[serde(default = "default_themes")]
    pub themes: Vec<String>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            passwd_file: default_passwd_file(),
            password_policy: PasswordPolicy::default(),
            themes: default_themes(),
        }
    }
}

fn default_passwd_file() -> PathBuf {
    PathBuf::from("/etc/passwd")
}
fn default_themes() -> Vec<String> {
    DEFAULT_THEMES.iter().map(|t| (*t).to_owned()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CliConfig {
    /// Operator the CLI acts as when `--actor` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

impl Config {
    /// Store file, falling back to the platform data directory.
    pub fn store_path(&self) -> PathBuf {
        self.store.path.clone().unwrap_or_else(default_store_path)
    }

    /// Check values figment cannot type-check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.web
            .listen
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Validation {
                field: "web.listen".into(),
                reason: format!("{e}: {}", self.web.listen),
            })?;

        let header = &self.web.user_header;
        if header.is_empty()
            || !header
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(ConfigError::Validation {
                field: "web.user_header".into(),
                reason: format!("expected a lowercase header name, got '{header}'"),
            });
        }

        if !(4..=31).contains(&self.accounts.password_policy.bcrypt_cost) {
            return Err(ConfigError::Validation {
                field: "accounts.password_policy.bcrypt_cost".into(),
                reason: "must be between 4 and 31".into(),
            });
        }
        Ok(())
    }

    /// Core settings; reads the passwd file named in the config.
    pub fn to_settings(&self) -> Settings {
        Settings {
            password_policy: self.accounts.password_policy.clone(),
            reserved: ReservedNames::from_passwd_file(&self.accounts.passwd_file),
            themes: self.accounts.themes.clone(),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "gatehouse", "gatehouse")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the configuration store.
pub fn default_store_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("store.json"),
        |dirs| dirs.data_dir().join("store.json"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("gatehouse");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from `path` layered with environment overrides.
///
/// Environment keys use `__` for nesting, e.g. `GATEHOUSE_WEB__LISTEN`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("GATEHOUSE_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}
