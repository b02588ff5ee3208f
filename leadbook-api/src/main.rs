//! leadbook-api - CRM HTTP service
//!
//! Serves the lead/client/history API over SQLite or Notion, AI lead
//! generation, Google sign-in and the SPA build.

use anyhow::{bail, Context, Result};
use clap::Parser;
use leadbook_common::api::AllowList;
use leadbook_common::config::{load_toml_config, locate_config_file, BackendKind};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use leadbook_api::backend::{CrmBackend, NotionBackend, SqlBackend};
use leadbook_api::config::{Cli, ServiceConfig};
use leadbook_api::services::{GeminiClient, GoogleTokenVerifier, NotionClient};
use leadbook_api::{build_router, db, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = locate_config_file(cli.config.as_deref());
    let toml = load_toml_config(config_path.as_deref())?;
    let config = ServiceConfig::resolve(cli, toml);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting leadbook-api v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }
    config.log_summary();

    let backend = build_backend(&config).await?;

    let allow_list = AllowList::load_or_empty(&config.allowed_users_path);
    if allow_list.is_empty() {
        info!("Allow-list empty: every verified Google account may sign in");
    } else {
        info!("Allow-list loaded ({} emails)", allow_list.len());
    }

    let verifier = Arc::new(GoogleTokenVerifier::new(config.google_client_id.clone())?);
    let mut state = AppState::new(backend, verifier, allow_list, config.static_dir.clone());
    if let Some(api_key) = &config.gemini_api_key {
        let model = GeminiClient::new(api_key.clone(), config.gemini_model.clone())?;
        state = state.with_lead_model(Arc::new(model));
    }

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!("leadbook-api listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn build_backend(config: &ServiceConfig) -> Result<Arc<dyn CrmBackend>> {
    match config.backend {
        BackendKind::Sql => {
            let pool = db::init_database(&config.database_path).await?;
            info!("✓ Connected to database");
            Ok(Arc::new(SqlBackend::new(pool)))
        }
        BackendKind::Notion => {
            let Some(api_key) = &config.notion_api_key else {
                bail!("backend = notion requires NOTION_API_KEY");
            };
            let client = NotionClient::new(api_key.clone())?;
            Ok(Arc::new(NotionBackend::new(client, config.notion_databases.clone())))
        }
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
