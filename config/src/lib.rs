//! Configuration for the SecureScape server.
//!
//! Read from `~/.securescape/config.toml` (or `$SECURESCAPE_CONFIG`). Every
//! field is optional; a missing file yields the defaults.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//! allowed_origins = ["http://localhost:3000", "http://localhost:8081"]
//!
//! [demo]
//! victim = "user1"
//! starting_balance = 10000.0
//!
//! [database]
//! path = "${HOME}/.securescape/demo.db"   # omitted -> in-memory
//! ```

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use securescape_types::DEFAULT_VICTIM_USERNAME;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_STARTING_BALANCE: f64 = 10_000.0;

/// Origins the secure route family accepts by default: the dev client and
/// the local attack site.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:3000",
    "http://localhost:8081",
    "http://127.0.0.1:5500",
];

const CONFIG_PATH_ENV: &str = "SECURESCAPE_CONFIG";
const BIND_ENV: &str = "SECURESCAPE_BIND";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecureScapeConfig {
    pub server: Option<ServerConfig>,
    pub demo: Option<DemoConfig>,
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: Option<String>,
    /// Origins allowed to call the secure routes with credentials.
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DemoConfig {
    /// Username every new session is silently logged in as.
    pub victim: Option<String>,
    pub starting_balance: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Supports `${VAR}` expansion.
    pub path: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid bind address '{value}': {source}")]
    Bind {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error("starting balance must be finite (got {0})")]
    StartingBalance(f64),
}

/// Where the demo database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    InMemory,
    File(PathBuf),
}

/// Fully resolved settings with defaults and environment overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind: SocketAddr,
    pub allowed_origins: Vec<String>,
    pub victim: String,
    pub starting_balance: f64,
    pub database: DatabaseLocation,
}

pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".securescape").join("config.toml"))
}

impl SecureScapeConfig {
    /// Load from the default location. `Ok(None)` when no file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {}", path.display(), source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {}", path.display(), source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Apply defaults and the `SECURESCAPE_BIND` override.
    pub fn resolve(self) -> Result<Settings, ConfigError> {
        let server = self.server.unwrap_or_default();
        let demo = self.demo.unwrap_or_default();
        let database = self.database.unwrap_or_default();

        let bind_raw = env::var(BIND_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or(server.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse()
            .map_err(|source| ConfigError::Bind {
                value: bind_raw.clone(),
                source,
            })?;

        let starting_balance = demo.starting_balance.unwrap_or(DEFAULT_STARTING_BALANCE);
        if !starting_balance.is_finite() {
            return Err(ConfigError::StartingBalance(starting_balance));
        }

        let database = match database.path.map(|p| expand_env_vars(&p)) {
            Some(path) if !path.trim().is_empty() => DatabaseLocation::File(PathBuf::from(path)),
            _ => DatabaseLocation::InMemory,
        };

        Ok(Settings {
            bind,
            allowed_origins: server.allowed_origins.unwrap_or_else(|| {
                DEFAULT_ALLOWED_ORIGINS
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            }),
            victim: demo
                .victim
                .unwrap_or_else(|| DEFAULT_VICTIM_USERNAME.to_string()),
            starting_balance,
            database,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(ToString::to_string)
                .collect(),
            victim: DEFAULT_VICTIM_USERNAME.to_string(),
            starting_balance: DEFAULT_STARTING_BALANCE,
            database: DatabaseLocation::InMemory,
        }
    }
}
