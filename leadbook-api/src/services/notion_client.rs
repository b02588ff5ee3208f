//! Notion REST client
//!
//! Thin wrapper over the database/page endpoints. Responses are decoded
//! into the lenient [`WorkspacePage`] / [`DatabaseSchema`] shapes; all
//! field interpretation happens in the normalization layer.

use async_trait::async_trait;
use leadbook_common::api::DateRange;
use leadbook_common::normalize::schema::PropertyMap;
use leadbook_common::normalize::{DatabaseSchema, WorkspacePage};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::time::Duration;
use thiserror::Error;

use crate::pagination::{collect_all, Page, PageSource, PAGE_SIZE};

const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";
const NOTION_API_VERSION: &str = "2022-06-28";
const USER_AGENT: &str = concat!("leadbook/", env!("CARGO_PKG_VERSION"));

/// Notion client errors
#[derive(Debug, Error)]
pub enum NotionError {
    #[error("Network error: {0}")]
    Network(String),

    /// Error reported by the API; the message is passed through verbatim
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for NotionError {
    fn from(e: reqwest::Error) -> Self {
        NotionError::Network(e.without_url().to_string())
    }
}

/// Filter and sort for a database query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseQuery {
    pub filter: Option<Value>,
    pub sorts: Vec<Value>,
}

impl DatabaseQuery {
    /// Unfiltered query in the database's own order
    pub fn all() -> Self {
        Self::default()
    }

    /// Unfiltered query, newest pages first
    pub fn newest_first() -> Self {
        Self {
            filter: None,
            sorts: vec![json!({"timestamp": "created_time", "direction": "descending"})],
        }
    }

    /// Restrict to pages created inside `range` (either bound optional)
    pub fn created_within(mut self, range: &DateRange) -> Self {
        let mut filters = Vec::new();
        if let Some(start) = range.start_date.as_deref().filter(|s| !s.is_empty()) {
            filters.push(json!({"timestamp": "created_time", "created_time": {"on_or_after": start}}));
        }
        if let Some(end) = range.end_date.as_deref().filter(|s| !s.is_empty()) {
            filters.push(json!({"timestamp": "created_time", "created_time": {"on_or_before": end}}));
        }

        self.filter = match filters.len() {
            0 => None,
            1 => filters.pop(),
            _ => Some(json!({"and": filters})),
        };
        self
    }

    fn body(&self, cursor: Option<&str>) -> Value {
        let mut body = Map::new();
        body.insert("page_size".into(), json!(PAGE_SIZE));
        if let Some(filter) = &self.filter {
            body.insert("filter".into(), filter.clone());
        }
        if !self.sorts.is_empty() {
            body.insert("sorts".into(), Value::Array(self.sorts.clone()));
        }
        if let Some(cursor) = cursor {
            body.insert("start_cursor".into(), json!(cursor));
        }
        Value::Object(body)
    }
}

/// Notion API client
pub struct NotionClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NotionClient {
    pub fn new(api_key: String) -> Result<Self, NotionError> {
        Self::with_base_url(api_key, NOTION_API_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, NotionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_API_VERSION)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, NotionError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Error bodies look like {"object":"error","code":...,"message":...}
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| format!("Notion API returned {}", status));
            return Err(NotionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| NotionError::Parse(e.to_string()))
    }

    /// Every page of a database matching `query`, following the cursor
    pub async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> Result<Vec<WorkspacePage>, NotionError> {
        tracing::debug!(database_id, "Querying Notion database");
        let source = DatabaseQuerySource {
            client: self,
            database_id,
            query,
        };
        collect_all(&source).await
    }

    pub async fn retrieve_database(&self, database_id: &str) -> Result<DatabaseSchema, NotionError> {
        self.send(self.request(Method::GET, &format!("databases/{}", database_id)))
            .await
    }

    pub async fn retrieve_page(&self, page_id: &str) -> Result<WorkspacePage, NotionError> {
        self.send(self.request(Method::GET, &format!("pages/{}", page_id)))
            .await
    }

    pub async fn create_page(
        &self,
        database_id: &str,
        properties: PropertyMap,
    ) -> Result<WorkspacePage, NotionError> {
        let body = json!({
            "parent": {"database_id": database_id},
            "properties": properties,
        });
        self.send(self.request(Method::POST, "pages").json(&body))
            .await
    }

    pub async fn update_page(
        &self,
        page_id: &str,
        properties: PropertyMap,
    ) -> Result<WorkspacePage, NotionError> {
        let body = json!({ "properties": properties });
        self.send(self.request(Method::PATCH, &format!("pages/{}", page_id)).json(&body))
            .await
    }
}

struct DatabaseQuerySource<'a> {
    client: &'a NotionClient,
    database_id: &'a str,
    query: &'a DatabaseQuery,
}

#[async_trait]
impl<'a> PageSource<WorkspacePage> for DatabaseQuerySource<'a> {
    type Error = NotionError;

    async fn fetch_page(&self, cursor: Option<String>) -> Result<Page<WorkspacePage>, NotionError> {
        let request = self
            .client
            .request(Method::POST, &format!("databases/{}/query", self.database_id))
            .json(&self.query.body(cursor.as_deref()));
        self.client.send(request).await
    }
}
