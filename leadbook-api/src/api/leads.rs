//! Lead endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use leadbook_common::api::{NewRecord, RecordUpdate};
use leadbook_common::Record;
use tracing::debug;

use super::require;
use crate::error::ApiError;
use crate::AppState;

/// GET /api/leads
pub async fn list_leads(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    let leads = state.backend.list_leads().await?;
    debug!("Listing {} leads", leads.len());
    Ok(Json(leads))
}

/// POST /api/leads
pub async fn create_lead(
    State(state): State<AppState>,
    payload: Result<Json<NewRecord>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let Json(lead) = payload?;
    require(&lead.name, "name")?;
    Ok(Json(state.backend.create_lead(lead).await?))
}

/// PUT /api/leads/:id
///
/// Partial update: only the fields present in the body change.
pub async fn update_lead(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<RecordUpdate>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    let Json(update) = payload?;
    if let Some(name) = &update.name {
        require(name, "name")?;
    }
    Ok(Json(state.backend.update_lead(&id, update).await?))
}
