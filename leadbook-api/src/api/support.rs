//! Support ticket endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use leadbook_common::api::{MessageResponse, NewSupportTicket};
use leadbook_common::SupportTicket;

use super::require;
use crate::error::ApiError;
use crate::AppState;

/// GET /api/support-tickets
pub async fn list_support_tickets(
    State(state): State<AppState>,
) -> Result<Json<Vec<SupportTicket>>, ApiError> {
    Ok(Json(state.backend.list_support_tickets().await?))
}

/// POST /api/support-tickets
///
/// With a `clientId` the ticket is logged against that client's history.
pub async fn create_support_ticket(
    State(state): State<AppState>,
    payload: Result<Json<NewSupportTicket>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(ticket) = payload?;
    require(&ticket.title, "title")?;
    Ok(Json(state.backend.create_support_ticket(ticket).await?))
}
