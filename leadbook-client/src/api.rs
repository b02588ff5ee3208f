//! HTTP client for leadbook-api
//!
//! [`CrmApi`] is the seam the store talks through; [`ApiClient`] is its
//! reqwest implementation.

use async_trait::async_trait;
use leadbook_common::api::{
    DateRange, ErrorResponse, GenerateLeadsRequest, GoogleAuthRequest, GoogleAuthResponse, MessageResponse,
    NewHistory, NewRecord, NewSupportTicket, RecordUpdate,
};
use leadbook_common::{HistoryItem, Record, SupportTicket};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ClientError, Result};

const USER_AGENT: &str = concat!("leadbook-client/", env!("CARGO_PKG_VERSION"));

/// Every endpoint of the service
#[async_trait]
pub trait CrmApi: Send + Sync {
    async fn list_leads(&self) -> Result<Vec<Record>>;
    async fn create_lead(&self, lead: &NewRecord) -> Result<Record>;
    async fn update_lead(&self, id: &str, update: &RecordUpdate) -> Result<Record>;

    async fn list_clients(&self) -> Result<Vec<Record>>;
    async fn create_client(&self, client: &NewRecord) -> Result<Record>;

    /// Lead interaction history
    async fn list_history(&self, range: &DateRange) -> Result<Vec<HistoryItem>>;
    async fn add_history(&self, note: &NewHistory) -> Result<HistoryItem>;

    /// Client interaction history
    async fn list_client_history(&self, range: &DateRange) -> Result<Vec<HistoryItem>>;
    async fn add_client_history(&self, note: &NewHistory) -> Result<HistoryItem>;

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>>;
    async fn create_support_ticket(&self, ticket: &NewSupportTicket) -> Result<MessageResponse>;

    async fn generate_leads(&self, location: &str) -> Result<Vec<Value>>;
    async fn sign_in(&self, token: &str) -> Result<GoogleAuthResponse>;
}

/// reqwest-backed [`CrmApi`]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the service root, e.g. `http://localhost:3001`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        debug!("GET {}", path);
        let response = self.http_client.get(self.url(path)).send().await?;
        decode(response).await
    }

    async fn get_with_range<T: DeserializeOwned>(&self, path: &str, range: &DateRange) -> Result<T> {
        debug!(start = ?range.start_date, end = ?range.end_date, "GET {}", path);
        let response = self.http_client.get(self.url(path)).query(range).send().await?;
        decode(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        debug!("{} {}", method, path);
        let response = self
            .http_client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        decode(response).await
    }
}

/// Decode a success body, or turn the `{"error": ...}` body into [`ClientError::Api`]
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let raw = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&raw)
        .map(|body| match body.message {
            Some(detail) => format!("{}: {}", body.error, detail),
            None => body.error,
        })
        .unwrap_or(raw);
    Err(ClientError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl CrmApi for ApiClient {
    async fn list_leads(&self) -> Result<Vec<Record>> {
        self.get("/api/leads").await
    }

    async fn create_lead(&self, lead: &NewRecord) -> Result<Record> {
        self.send_json(reqwest::Method::POST, "/api/leads", lead).await
    }

    async fn update_lead(&self, id: &str, update: &RecordUpdate) -> Result<Record> {
        self.send_json(reqwest::Method::PUT, &format!("/api/leads/{}", id), update)
            .await
    }

    async fn list_clients(&self) -> Result<Vec<Record>> {
        self.get("/api/clients").await
    }

    async fn create_client(&self, client: &NewRecord) -> Result<Record> {
        self.send_json(reqwest::Method::POST, "/api/clients", client).await
    }

    async fn list_history(&self, range: &DateRange) -> Result<Vec<HistoryItem>> {
        self.get_with_range("/api/history", range).await
    }

    async fn add_history(&self, note: &NewHistory) -> Result<HistoryItem> {
        self.send_json(reqwest::Method::POST, "/api/history", note).await
    }

    async fn list_client_history(&self, range: &DateRange) -> Result<Vec<HistoryItem>> {
        self.get_with_range("/api/clients/history", range).await
    }

    async fn add_client_history(&self, note: &NewHistory) -> Result<HistoryItem> {
        self.send_json(reqwest::Method::POST, "/api/clients/history", note)
            .await
    }

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>> {
        self.get("/api/support-tickets").await
    }

    async fn create_support_ticket(&self, ticket: &NewSupportTicket) -> Result<MessageResponse> {
        self.send_json(reqwest::Method::POST, "/api/support-tickets", ticket)
            .await
    }

    async fn generate_leads(&self, location: &str) -> Result<Vec<Value>> {
        let request = GenerateLeadsRequest {
            location: location.to_string(),
        };
        self.send_json(reqwest::Method::POST, "/api/ai/generate-leads", &request)
            .await
    }

    async fn sign_in(&self, token: &str) -> Result<GoogleAuthResponse> {
        let request = GoogleAuthRequest {
            token: token.to_string(),
        };
        self.send_json(reqwest::Method::POST, "/api/auth/google", &request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ApiClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.url("/api/leads"), "http://localhost:3001/api/leads");
    }
}
