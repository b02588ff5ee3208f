//! AI lead generation endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use leadbook_common::api::GenerateLeadsRequest;
use serde_json::Value;
use tracing::info;

use super::require;
use crate::error::ApiError;
use crate::services::{gemini_client, GeminiError};
use crate::AppState;

/// POST /api/ai/generate-leads
///
/// Returns the model's JSON array as-is; elements are not validated.
pub async fn generate_leads(
    State(state): State<AppState>,
    payload: Result<Json<GenerateLeadsRequest>, JsonRejection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let model = state.lead_model.as_ref().ok_or(GeminiError::MissingApiKey)?;
    let Json(request) = payload?;
    require(&request.location, "location")?;

    let leads = gemini_client::generate_leads(model.as_ref(), &request.location).await?;
    info!(location = %request.location, count = leads.len(), "Generated leads");
    Ok(Json(leads))
}
