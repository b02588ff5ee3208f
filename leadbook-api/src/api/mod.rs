//! HTTP API handlers for leadbook-api

pub mod ai;
pub mod auth;
pub mod clients;
pub mod health;
pub mod history;
pub mod leads;
pub mod support;
pub mod ui;

pub use ai::generate_leads;
pub use auth::google_sign_in;
pub use clients::{create_client, list_clients};
pub use health::health_routes;
pub use history::{add_client_history, add_history, list_client_history, list_history};
pub use leads::{create_lead, list_leads, update_lead};
pub use support::{create_support_ticket, list_support_tickets};
pub use ui::spa_fallback;

use crate::error::ApiError;

/// Reject blank required string fields with a 400
pub(crate) fn require(value: &str, field: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} is required", field)));
    }
    Ok(())
}
