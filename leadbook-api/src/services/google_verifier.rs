//! Google ID token verification
//!
//! Uses Google's `tokeninfo` endpoint, which validates the signature and
//! expiry server-side, then checks the audience against the configured
//! OAuth client id.

use async_trait::async_trait;
use leadbook_common::api::GoogleIdentity;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

/// Why a token was rejected
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Token rejected: {0}")]
    Rejected(String),

    #[error("Audience mismatch")]
    WrongAudience,

    #[error("Network error: {0}")]
    Network(String),
}

/// Turns an ID token into a verified identity
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<GoogleIdentity, VerifyError>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verifier backed by the Google tokeninfo endpoint
pub struct GoogleTokenVerifier {
    http_client: reqwest::Client,
    /// Expected audience; any audience is accepted when unset
    client_id: Option<String>,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: Option<String>) -> Result<Self, VerifyError> {
        if client_id.is_none() {
            tracing::warn!("GOOGLE_CLIENT_ID not set; token audience will not be checked");
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| VerifyError::Network(e.without_url().to_string()))?;

        Ok(Self {
            http_client,
            client_id,
        })
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<GoogleIdentity, VerifyError> {
        if token.trim().is_empty() {
            return Err(VerifyError::Rejected("empty token".to_string()));
        }

        let response = self
            .http_client
            .get(TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|e| VerifyError::Network(e.without_url().to_string()))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifyError::Rejected(body));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| VerifyError::Rejected(e.without_url().to_string()))?;

        if let Some(expected) = &self.client_id {
            if info.aud != *expected {
                return Err(VerifyError::WrongAudience);
            }
        }

        Ok(GoogleIdentity {
            email: info.email,
            name: info.name,
            picture: info.picture,
        })
    }
}
