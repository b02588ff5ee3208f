//! HTTP error type
//!
//! Every failing endpoint answers with a JSON body `{"error": "<message>"}`.
//! The 403 produced by the allow-list also carries a `message` field.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadbook_common::api::ErrorResponse;
use thiserror::Error;
use tracing::error;

use crate::services::{GeminiError, NotionError};

/// API error mapped to an HTTP status
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Token could not be verified (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Verified identity not on the allow-list (403)
    #[error("{0}")]
    Forbidden(String),

    /// Unknown record or route (404)
    #[error("{0}")]
    NotFound(String),

    /// Required setting absent, e.g. a database id (500)
    #[error("{0}")]
    MissingConfig(String),

    /// Remote service or database failure, message passed through (500)
    #[error("{0}")]
    Upstream(String),

    /// Anything else (500)
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// `Missing <ENV_NAME>` for an unset database id
    pub fn missing(env_name: &str) -> Self {
        ApiError::MissingConfig(format!("Missing {}", env_name))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MissingConfig(_) | ApiError::Upstream(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{}", self);
        }

        let body = match self {
            ApiError::Forbidden(message) => ErrorResponse {
                error: "Access Denied".to_string(),
                message: Some(message),
            },
            other => ErrorResponse {
                error: other.to_string(),
                message: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<NotionError> for ApiError {
    fn from(e: NotionError) -> Self {
        ApiError::Upstream(e.to_string())
    }
}

impl From<GeminiError> for ApiError {
    fn from(e: GeminiError) -> Self {
        match e {
            GeminiError::MissingApiKey => ApiError::MissingConfig(e.to_string()),
            // The raw model output stays in the logs
            GeminiError::InvalidOutput(detail) => {
                error!("Unusable model output: {}", detail);
                ApiError::Internal("Failed to generate leads".to_string())
            }
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::missing("NOTION_DATABASE_ID").status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_missing_message() {
        assert_eq!(
            ApiError::missing("NOTION_HISTORY_DB_ID").to_string(),
            "Missing NOTION_HISTORY_DB_ID"
        );
    }

    #[test]
    fn test_gemini_parse_failure_is_generic() {
        let err: ApiError = GeminiError::InvalidOutput("not json".into()).into();
        assert_eq!(err.to_string(), "Failed to generate leads");
        let err: ApiError = GeminiError::MissingApiKey.into();
        assert_eq!(err.to_string(), "GEMINI_API_KEY not configured");
    }

    #[test]
    fn test_row_not_found_is_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
