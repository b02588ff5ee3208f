//! Interaction history endpoints
//!
//! `/api/history` covers lead interactions and `/api/clients/history`
//! client interactions. Both listings accept optional `startDate` and
//! `endDate` query parameters.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use leadbook_common::api::{DateRange, NewHistory};
use leadbook_common::HistoryItem;

use super::require;
use crate::backend::HistoryScope;
use crate::error::ApiError;
use crate::AppState;

async fn list(
    state: AppState,
    scope: HistoryScope,
    range: Result<Query<DateRange>, QueryRejection>,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    let Query(range) = range?;
    Ok(Json(state.backend.list_history(scope, range).await?))
}

async fn add(
    state: AppState,
    scope: HistoryScope,
    payload: Result<Json<NewHistory>, JsonRejection>,
) -> Result<Json<HistoryItem>, ApiError> {
    let Json(note) = payload?;
    require(&note.interaction_type, "interactionType")?;
    require(&note.agent, "agent")?;
    Ok(Json(state.backend.add_history(scope, note).await?))
}

/// GET /api/history
pub async fn list_history(
    State(state): State<AppState>,
    range: Result<Query<DateRange>, QueryRejection>,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    list(state, HistoryScope::Leads, range).await
}

/// POST /api/history
pub async fn add_history(
    State(state): State<AppState>,
    payload: Result<Json<NewHistory>, JsonRejection>,
) -> Result<Json<HistoryItem>, ApiError> {
    add(state, HistoryScope::Leads, payload).await
}

/// GET /api/clients/history
pub async fn list_client_history(
    State(state): State<AppState>,
    range: Result<Query<DateRange>, QueryRejection>,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    list(state, HistoryScope::Clients, range).await
}

/// POST /api/clients/history
pub async fn add_client_history(
    State(state): State<AppState>,
    payload: Result<Json<NewHistory>, JsonRejection>,
) -> Result<Json<HistoryItem>, ApiError> {
    add(state, HistoryScope::Clients, payload).await
}
