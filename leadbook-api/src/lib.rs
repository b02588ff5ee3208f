//! leadbook-api library
//!
//! CRM HTTP service: leads, clients, interaction history and support
//! tickets over a pluggable storage backend, plus AI lead generation and
//! Google sign-in gated by an allow-list. The SPA build is served from the
//! static directory.

use axum::Router;
use leadbook_common::api::AllowList;
use std::path::PathBuf;
use std::sync::Arc;

pub mod api;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod pagination;
pub mod services;

use backend::CrmBackend;
use services::{TextModel, TokenVerifier};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Storage answering the CRUD endpoints
    pub backend: Arc<dyn CrmBackend>,
    /// Generative model; `None` when no API key is configured
    pub lead_model: Option<Arc<dyn TextModel>>,
    pub verifier: Arc<dyn TokenVerifier>,
    /// Emails allowed to sign in (empty permits everyone)
    pub allow_list: Arc<AllowList>,
    /// Directory holding `index.html` and the SPA assets
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn CrmBackend>,
        verifier: Arc<dyn TokenVerifier>,
        allow_list: AllowList,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            backend,
            lead_model: None,
            verifier,
            allow_list: Arc::new(allow_list),
            static_dir,
        }
    }

    /// Enable lead generation with the given model
    pub fn with_lead_model(mut self, model: Arc<dyn TextModel>) -> Self {
        self.lead_model = Some(model);
        self
    }
}

/// Build application router
///
/// `/api/*` and `/health` are handled here; every other path is tried
/// against the static directory and falls back to the SPA entry point.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};
    use tower_http::cors::CorsLayer;
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    let api = Router::new()
        .route("/api/leads", get(api::list_leads).post(api::create_lead))
        .route("/api/leads/:id", put(api::update_lead))
        .route("/api/clients", get(api::list_clients).post(api::create_client))
        .route(
            "/api/clients/history",
            get(api::list_client_history).post(api::add_client_history),
        )
        .route("/api/history", get(api::list_history).post(api::add_history))
        .route(
            "/api/support-tickets",
            get(api::list_support_tickets).post(api::create_support_ticket),
        )
        .route("/api/ai/generate-leads", post(api::generate_leads))
        .route("/api/auth/google", post(api::google_sign_in))
        .merge(api::health_routes());

    let static_files = ServeDir::new(&state.static_dir)
        .call_fallback_on_method_not_allowed(true)
        .fallback(axum::routing::any(api::spa_fallback).with_state::<()>(state.clone()));

    Router::new()
        .merge(api)
        .fallback_service(static_files)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
