//! SPA fallback
//!
//! Reached only when no API route and no static file matched.

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use leadbook_common::api::ErrorResponse;
use tracing::warn;

use crate::AppState;

fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not found".to_string(),
            message: None,
        }),
    )
        .into_response()
}

/// Serve `index.html` to browser navigations, JSON 404 to everything else
pub async fn spa_fallback(State(state): State<AppState>, method: Method, headers: HeaderMap) -> Response {
    if method != Method::GET || !accepts_html(&headers) {
        return not_found();
    }

    let index = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&index).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!("Cannot serve {}: {}", index.display(), e);
            not_found()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_accepts_html() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_html(&headers));

        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
        );
        assert!(accepts_html(&headers));

        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        assert!(!accepts_html(&headers));
    }
}
