//! Client endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use leadbook_common::api::NewRecord;
use leadbook_common::Record;

use super::require;
use crate::error::ApiError;
use crate::AppState;

/// GET /api/clients
pub async fn list_clients(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.backend.list_clients().await?))
}

/// POST /api/clients
pub async fn create_client(
    State(state): State<AppState>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let Json(client) = payload?;
    require(&client.name, "name")?;
    Ok(Json(state.backend.create_client(client).await?))
}
