//! Service configuration
//!
//! `clap` merges the command line with environment variables; the result
//! is layered over the TOML file and compiled defaults by
//! [`ServiceConfig::resolve`].

use clap::Parser;
use leadbook_common::config::{
    default_database_path, resolve, resolve_optional, BackendKind, TomlConfig, DEFAULT_ALLOWED_USERS_FILE,
    DEFAULT_BIND, DEFAULT_GEMINI_MODEL, DEFAULT_STATIC_DIR,
};
use std::path::PathBuf;
use tracing::info;

use crate::backend::NotionDatabases;

/// Default tracing filter when neither RUST_LOG nor a level is configured
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Command-line arguments for leadbook-api
#[derive(Parser, Debug, Default)]
#[command(name = "leadbook-api")]
#[command(about = "CRM HTTP API backed by SQLite or Notion")]
#[command(version)]
pub struct Cli {
    /// Explicit TOML config file
    #[arg(short, long, env = "LEADBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage backend: sql or notion
    #[arg(long, env = "LEADBOOK_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Listen address
    #[arg(short, long, env = "LEADBOOK_BIND")]
    pub bind: Option<String>,

    /// SQLite database file (sql backend)
    #[arg(long, env = "LEADBOOK_DATABASE_PATH")]
    pub database_path: Option<PathBuf>,

    /// Directory holding the SPA build
    #[arg(long, env = "LEADBOOK_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// JSON array of allowed sign-in emails
    #[arg(long, env = "LEADBOOK_ALLOWED_USERS")]
    pub allowed_users: Option<PathBuf>,

    /// tracing filter directive
    #[arg(long, env = "LEADBOOK_LOG")]
    pub log_level: Option<String>,

    #[arg(long, env = "NOTION_API_KEY", hide_env_values = true)]
    pub notion_api_key: Option<String>,

    #[arg(long, env = "NOTION_DATABASE_ID")]
    pub notion_leads_db_id: Option<String>,

    #[arg(long, env = "NOTION_HISTORY_DB_ID")]
    pub notion_history_db_id: Option<String>,

    #[arg(long, env = "NOTION_CLIENTS_DB_ID")]
    pub notion_clients_db_id: Option<String>,

    #[arg(long, env = "NOTION_CLIENTS_HISTORY_DB_ID")]
    pub notion_clients_history_db_id: Option<String>,

    #[arg(long, env = "NOTION_SUPPORT_DB_ID")]
    pub notion_support_db_id: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    /// OAuth client id expected as the token audience
    #[arg(long, env = "GOOGLE_CLIENT_ID")]
    pub google_client_id: Option<String>,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub backend: BackendKind,
    pub bind: String,
    pub database_path: PathBuf,
    pub static_dir: PathBuf,
    pub allowed_users_path: PathBuf,
    pub log_level: String,
    pub notion_api_key: Option<String>,
    pub notion_databases: NotionDatabases,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub google_client_id: Option<String>,
}

impl ServiceConfig {
    /// Layer CLI/env over TOML over defaults
    pub fn resolve(cli: Cli, toml: TomlConfig) -> Self {
        let TomlConfig {
            backend,
            bind,
            database_path,
            static_dir,
            allowed_users_path,
            logging,
            notion,
            gemini,
            google,
        } = toml;

        Self {
            backend: resolve(cli.backend, backend, BackendKind::default()),
            bind: resolve(cli.bind, bind, DEFAULT_BIND.to_string()),
            database_path: cli
                .database_path
                .or(database_path)
                .unwrap_or_else(default_database_path),
            static_dir: resolve(cli.static_dir, static_dir, PathBuf::from(DEFAULT_STATIC_DIR)),
            allowed_users_path: resolve(
                cli.allowed_users,
                allowed_users_path,
                PathBuf::from(DEFAULT_ALLOWED_USERS_FILE),
            ),
            log_level: resolve_optional(cli.log_level, logging.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            notion_api_key: resolve_optional(cli.notion_api_key, notion.api_key),
            notion_databases: NotionDatabases {
                leads: resolve_optional(cli.notion_leads_db_id, notion.leads_db_id),
                history: resolve_optional(cli.notion_history_db_id, notion.history_db_id),
                clients: resolve_optional(cli.notion_clients_db_id, notion.clients_db_id),
                clients_history: resolve_optional(cli.notion_clients_history_db_id, notion.clients_history_db_id),
                support: resolve_optional(cli.notion_support_db_id, notion.support_db_id),
            },
            gemini_api_key: resolve_optional(cli.gemini_api_key, gemini.api_key),
            gemini_model: resolve_optional(cli.gemini_model, gemini.model)
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            google_client_id: resolve_optional(cli.google_client_id, google.client_id),
        }
    }

    /// Log the effective settings without secrets
    pub fn log_summary(&self) {
        info!("Backend: {}", self.backend);
        match self.backend {
            BackendKind::Sql => info!("Database path: {}", self.database_path.display()),
            BackendKind::Notion => {
                let dbs = &self.notion_databases;
                info!(
                    leads = dbs.leads.is_some(),
                    history = dbs.history.is_some(),
                    clients = dbs.clients.is_some(),
                    clients_history = dbs.clients_history.is_some(),
                    support = dbs.support.is_some(),
                    "Notion databases configured"
                );
            }
        }
        info!("Static dir: {}", self.static_dir.display());
        info!("Allow-list: {}", self.allowed_users_path.display());
        info!(
            "Lead generation: {}",
            if self.gemini_api_key.is_some() { "enabled" } else { "disabled (GEMINI_API_KEY not set)" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "LEADBOOK_CONFIG",
        "LEADBOOK_BACKEND",
        "LEADBOOK_BIND",
        "LEADBOOK_DATABASE_PATH",
        "LEADBOOK_STATIC_DIR",
        "LEADBOOK_ALLOWED_USERS",
        "LEADBOOK_LOG",
        "NOTION_API_KEY",
        "NOTION_DATABASE_ID",
        "NOTION_HISTORY_DB_ID",
        "NOTION_CLIENTS_DB_ID",
        "NOTION_CLIENTS_HISTORY_DB_ID",
        "NOTION_SUPPORT_DB_ID",
        "GEMINI_API_KEY",
        "GEMINI_MODEL",
        "GOOGLE_CLIENT_ID",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_nothing_configured() {
        clear_env();
        let cli = Cli::parse_from(["leadbook-api"]);
        let config = ServiceConfig::resolve(cli, TomlConfig::default());

        assert_eq!(config.backend, BackendKind::Sql);
        assert_eq!(config.bind, "0.0.0.0:3001");
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.allowed_users_path, PathBuf::from("allowed_users.json"));
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.log_level, "info");
        assert!(config.notion_databases.leads.is_none());
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    #[serial]
    fn test_env_overrides_toml() {
        clear_env();
        std::env::set_var("NOTION_DATABASE_ID", "env-leads");
        std::env::set_var("LEADBOOK_BACKEND", "notion");

        let toml = TomlConfig::parse(
            r#"
            backend = "sql"
            bind = "127.0.0.1:4000"

            [notion]
            leads_db_id = "toml-leads"
            support_db_id = "toml-support"
            "#,
        )
        .unwrap();
        let config = ServiceConfig::resolve(Cli::parse_from(["leadbook-api"]), toml);
        clear_env();

        assert_eq!(config.backend, BackendKind::Notion);
        assert_eq!(config.bind, "127.0.0.1:4000");
        assert_eq!(config.notion_databases.leads.as_deref(), Some("env-leads"));
        assert_eq!(config.notion_databases.support.as_deref(), Some("toml-support"));
    }

    #[test]
    #[serial]
    fn test_argument_overrides_env() {
        clear_env();
        std::env::set_var("LEADBOOK_BIND", "0.0.0.0:9000");

        let cli = Cli::parse_from(["leadbook-api", "--bind", "127.0.0.1:3005"]);
        let config = ServiceConfig::resolve(cli, TomlConfig::default());
        clear_env();

        assert_eq!(config.bind, "127.0.0.1:3005");
    }

    #[test]
    #[serial]
    fn test_blank_env_falls_through_to_toml() {
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "");

        let toml = TomlConfig::parse("[gemini]\napi_key = \"from-file\"\n").unwrap();
        let config = ServiceConfig::resolve(Cli::parse_from(["leadbook-api"]), toml);
        clear_env();

        assert_eq!(config.gemini_api_key.as_deref(), Some("from-file"));
    }
}
