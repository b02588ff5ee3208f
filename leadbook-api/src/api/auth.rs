//! Google sign-in endpoint
//!
//! The ID token is verified with Google, then the email is checked against
//! the allow-list. An empty allow-list admits every verified identity.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use leadbook_common::api::{AuthUser, GoogleAuthRequest, GoogleAuthResponse};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

/// Message of the 403 for a verified but unlisted email
pub const NOT_ALLOWED: &str = "Email not in allowed list.";

/// Message of the 401 for a token that failed verification
pub const INVALID_TOKEN: &str = "Invalid Token";

/// POST /api/auth/google
pub async fn google_sign_in(
    State(state): State<AppState>,
    payload: Result<Json<GoogleAuthRequest>, JsonRejection>,
) -> Result<Json<GoogleAuthResponse>, ApiError> {
    let Json(request) = payload?;

    let identity = state.verifier.verify(&request.token).await.map_err(|e| {
        warn!("Auth error: {}", e);
        ApiError::Unauthorized(INVALID_TOKEN.to_string())
    })?;

    if !state.allow_list.permits(&identity.email) {
        warn!(email = %identity.email, "Sign-in refused: not on allow-list");
        return Err(ApiError::Forbidden(NOT_ALLOWED.to_string()));
    }

    info!(email = %identity.email, "User signed in");
    Ok(Json(GoogleAuthResponse {
        success: true,
        user: AuthUser {
            email: identity.email,
            name: identity.name,
            picture: identity.picture,
        },
    }))
}
