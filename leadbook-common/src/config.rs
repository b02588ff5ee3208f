//! Configuration loading
//!
//! Every setting resolves in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Command-line and environment are merged by the binary's argument
//! parser; this module supplies the TOML layer and the defaults. A missing
//! TOML file is never an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LEADBOOK_CONFIG";

/// Default listen address
pub const DEFAULT_BIND: &str = "0.0.0.0:3001";

/// Default directory holding the SPA build
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Default allow-list file name
pub const DEFAULT_ALLOWED_USERS_FILE: &str = "allowed_users.json";

/// Default generative model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

/// Which store answers the CRUD endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local SQLite database
    #[default]
    Sql,
    /// Notion workspace databases
    Notion,
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sql" | "sqlite" => Ok(BackendKind::Sql),
            "notion" | "workspace" => Ok(BackendKind::Notion),
            other => Err(Error::Config(format!(
                "Unknown backend '{}' (expected 'sql' or 'notion')",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sql => f.write_str("sql"),
            BackendKind::Notion => f.write_str("notion"),
        }
    }
}

/// Logging section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "leadbook_api=debug"
    pub level: Option<String>,
}

/// Notion section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotionConfig {
    pub api_key: Option<String>,
    pub leads_db_id: Option<String>,
    pub history_db_id: Option<String>,
    pub clients_db_id: Option<String>,
    pub clients_history_db_id: Option<String>,
    pub support_db_id: Option<String>,
}

/// Gemini section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

/// Google sign-in section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
}

/// TOML configuration file contents
///
/// ```toml
/// backend = "notion"
/// bind = "0.0.0.0:3001"
///
/// [notion]
/// api_key = "secret_..."
/// leads_db_id = "..."
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    pub backend: Option<BackendKind>,
    pub bind: Option<String>,
    pub database_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub allowed_users_path: Option<PathBuf>,
    pub logging: LoggingConfig,
    pub notion: NotionConfig,
    pub gemini: GeminiConfig,
    pub google: GoogleConfig,
}

impl TomlConfig {
    /// Parse TOML text
    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }
}

/// Locate the config file.
///
/// Explicit path (argument, then `LEADBOOK_CONFIG`) wins; otherwise the
/// platform locations are probed and the first existing file is returned.
pub fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir().map(|d| d.join("leadbook").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/leadbook/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Load the TOML layer.
///
/// No path, or a path that does not exist, yields the all-`None` default
/// with a warning. A file that exists but does not parse is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        info!("No config file found, using environment and defaults");
        return Ok(TomlConfig::default());
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = TomlConfig::parse(&raw)?;
    info!("Loaded config file {}", path.display());
    Ok(config)
}

/// First of the layered values, or the compiled default
pub fn resolve<T>(cli_or_env: Option<T>, toml: Option<T>, default: T) -> T {
    cli_or_env.or(toml).unwrap_or(default)
}

/// Layered optional value where blank strings count as unset
pub fn resolve_optional(cli_or_env: Option<String>, toml: Option<String>) -> Option<String> {
    non_blank(cli_or_env).or_else(|| non_blank(toml))
}

/// Treat empty or whitespace-only values as absent
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// OS-dependent default data folder (holds the SQLite database)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("leadbook"))
        .unwrap_or_else(|| PathBuf::from("./leadbook_data"))
}

/// Default SQLite database path
pub fn default_database_path() -> PathBuf {
    default_data_dir().join("leadbook.db")
}
