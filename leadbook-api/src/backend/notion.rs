//! Notion backend
//!
//! Each collection is a separate Notion database identified by id. Reads
//! run the full pagination loop and normalize every page; writes build
//! property maps from discovered or fixed column names.
//!
//! Unset database ids behave differently per path: writes, and reads of
//! leads and lead history, fail with `Missing <ENV>`; reads of clients,
//! client history and support tickets return an empty list.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use leadbook_common::api::{DateRange, MessageResponse, NewHistory, NewRecord, NewSupportTicket, RecordUpdate};
use leadbook_common::normalize::{
    self, defaults, schema::record_properties, HistorySchema, RecordColumns, RelationWrite, WorkspacePage,
};
use leadbook_common::{HistoryItem, Record, RecordKind, SupportTicket};
use tracing::{info, warn};

use super::{support_ticket_note, CrmBackend, HistoryScope, SUPPORT_TICKET_LOGGED};
use crate::error::ApiError;
use crate::services::{DatabaseQuery, NotionClient, NotionError};

/// Database ids, each keyed by the environment variable that sets it
#[derive(Debug, Clone, Default)]
pub struct NotionDatabases {
    /// NOTION_DATABASE_ID
    pub leads: Option<String>,
    /// NOTION_HISTORY_DB_ID
    pub history: Option<String>,
    /// NOTION_CLIENTS_DB_ID
    pub clients: Option<String>,
    /// NOTION_CLIENTS_HISTORY_DB_ID
    pub clients_history: Option<String>,
    /// NOTION_SUPPORT_DB_ID
    pub support: Option<String>,
}

fn required<'a>(id: &'a Option<String>, env_name: &str) -> Result<&'a str, ApiError> {
    id.as_deref().ok_or_else(|| ApiError::missing(env_name))
}

fn optional<'a>(id: &'a Option<String>, env_name: &str) -> Option<&'a str> {
    if id.is_none() {
        warn!("{} not set", env_name);
    }
    id.as_deref()
}

/// Backend over Notion databases
pub struct NotionBackend {
    client: NotionClient,
    databases: NotionDatabases,
}

impl NotionBackend {
    pub fn new(client: NotionClient, databases: NotionDatabases) -> Self {
        Self { client, databases }
    }

    fn history_database(&self, scope: HistoryScope) -> (&Option<String>, &'static str) {
        match scope {
            HistoryScope::Leads => (&self.databases.history, "NOTION_HISTORY_DB_ID"),
            HistoryScope::Clients => (&self.databases.clients_history, "NOTION_CLIENTS_HISTORY_DB_ID"),
        }
    }

    async fn list_records(&self, database_id: &str, kind: RecordKind) -> Result<Vec<Record>, ApiError> {
        let pages = self
            .client
            .query_database(database_id, &DatabaseQuery::all())
            .await?;
        Ok(pages
            .iter()
            .map(|page| normalize::normalize_record(page, kind))
            .collect())
    }

    async fn create_record(&self, database_id: &str, kind: RecordKind, record: NewRecord) -> Result<Record, ApiError> {
        if record.name.trim().is_empty() {
            return Err(ApiError::BadRequest("name is required".to_string()));
        }
        let page = self
            .client
            .create_page(database_id, record_properties(&record))
            .await?;
        info!("Created {:?} page {}", kind, page.id);
        Ok(normalize::normalize_record(&page, kind))
    }

    /// Decide what goes into the relation column of a new history page
    async fn relation_for(&self, schema: &HistorySchema, related_id: Option<&str>) -> RelationWrite {
        let Some(id) = related_id else {
            return RelationWrite::Skip;
        };

        if schema.links_relation() {
            return RelationWrite::Link(id.to_string());
        }
        if !schema.names_relation() {
            return RelationWrite::Skip;
        }

        RelationWrite::Name(related_name(id, self.client.retrieve_page(id).await))
    }

    async fn create_history(
        &self,
        scope: HistoryScope,
        database_id: &str,
        note: &NewHistory,
    ) -> Result<HistoryItem, ApiError> {
        let schema = HistorySchema::discover(&self.client.retrieve_database(database_id).await?);
        if schema.relation.is_none() && note.related_id().is_some() {
            warn!("History database {} has no relation column; relation dropped", database_id);
        }

        let relation = self.relation_for(&schema, note.related_id()).await;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let properties = schema.properties(&note.agent, relation, &note.interaction_type, &note.text, &now);

        let page = self.client.create_page(database_id, properties).await?;
        Ok(scoped_history(&page, scope))
    }
}

/// Text written into a text-typed relation column for page `id`
fn related_name(id: &str, fetched: Result<WorkspacePage, NotionError>) -> String {
    match fetched {
        Ok(page) => normalize::page_title(&page).unwrap_or_else(|| defaults::UNKNOWN_CLIENT.to_string()),
        Err(e) => {
            warn!("Could not fetch related page {}: {}", id, e);
            format!("ID: {}", id)
        }
    }
}

/// Normalize a history page read from the database of `scope`
fn scoped_history(page: &WorkspacePage, scope: HistoryScope) -> HistoryItem {
    let mut item = normalize::normalize_history(page);
    if item.client_id.is_some() {
        item.related_kind = Some(scope.record_kind());
    }
    item
}

#[async_trait]
impl CrmBackend for NotionBackend {
    fn name(&self) -> &'static str {
        "notion"
    }

    async fn list_leads(&self) -> Result<Vec<Record>, ApiError> {
        let database_id = required(&self.databases.leads, "NOTION_DATABASE_ID")?;
        self.list_records(database_id, RecordKind::Lead).await
    }

    async fn create_lead(&self, lead: NewRecord) -> Result<Record, ApiError> {
        let database_id = required(&self.databases.leads, "NOTION_DATABASE_ID")?;
        self.create_record(database_id, RecordKind::Lead, lead).await
    }

    async fn update_lead(&self, id: &str, update: RecordUpdate) -> Result<Record, ApiError> {
        let page = self.client.retrieve_page(id).await?;
        let properties = RecordColumns::discover(&page).update_properties(&update);
        if properties.is_empty() {
            return Ok(normalize::normalize_record(&page, RecordKind::Lead));
        }

        let updated = self.client.update_page(id, properties).await?;
        info!("Updated lead page {}", id);
        Ok(normalize::normalize_record(&updated, RecordKind::Lead))
    }

    async fn list_clients(&self) -> Result<Vec<Record>, ApiError> {
        match optional(&self.databases.clients, "NOTION_CLIENTS_DB_ID") {
            Some(database_id) => self.list_records(database_id, RecordKind::Client).await,
            None => Ok(Vec::new()),
        }
    }

    async fn create_client(&self, client: NewRecord) -> Result<Record, ApiError> {
        let database_id = required(&self.databases.clients, "NOTION_CLIENTS_DB_ID")?;
        self.create_record(database_id, RecordKind::Client, client).await
    }

    async fn list_history(&self, scope: HistoryScope, range: DateRange) -> Result<Vec<HistoryItem>, ApiError> {
        let (id, env_name) = self.history_database(scope);
        let database_id = match scope {
            HistoryScope::Leads => required(id, env_name)?,
            HistoryScope::Clients => match optional(id, env_name) {
                Some(database_id) => database_id,
                None => return Ok(Vec::new()),
            },
        };

        let query = DatabaseQuery::newest_first().created_within(&range);
        let pages = self.client.query_database(database_id, &query).await?;
        Ok(pages.iter().map(|page| scoped_history(page, scope)).collect())
    }

    async fn add_history(&self, scope: HistoryScope, note: NewHistory) -> Result<HistoryItem, ApiError> {
        let (id, env_name) = self.history_database(scope);
        let database_id = required(id, env_name)?;
        self.create_history(scope, database_id, &note).await
    }

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>, ApiError> {
        let Some(database_id) = optional(&self.databases.support, "NOTION_SUPPORT_DB_ID") else {
            return Ok(Vec::new());
        };

        match self
            .client
            .query_database(database_id, &DatabaseQuery::newest_first())
            .await
        {
            Ok(pages) => Ok(pages.iter().map(normalize::normalize_ticket).collect()),
            Err(e) => {
                warn!("Error fetching support tickets: {}", e);
                Ok(Vec::new())
            }
        }
    }

    async fn create_support_ticket(&self, ticket: NewSupportTicket) -> Result<MessageResponse, ApiError> {
        info!(
            title = %ticket.title,
            priority = %ticket.priority,
            client_id = ?ticket.client_id,
            "Support ticket received"
        );

        if ticket.client_id.as_deref().is_some_and(|id| !id.trim().is_empty()) {
            let database_id = required(&self.databases.clients_history, "NOTION_CLIENTS_HISTORY_DB_ID")?;
            let (title, comment) = support_ticket_note(&ticket);
            let note = NewHistory {
                text: comment,
                agent: defaults::SYSTEM_AGENT.to_string(),
                interaction_type: title,
                title: None,
                lead_id: None,
                client_id: ticket.client_id.clone(),
            };
            self.create_history(HistoryScope::Clients, database_id, &note).await?;
        }

        Ok(MessageResponse {
            message: SUPPORT_TICKET_LOGGED.to_string(),
        })
    }
}
