//! Storage backends
//!
//! Handlers talk to a [`CrmBackend`] and never know whether the data lives
//! in the local SQLite database or in Notion databases.

use async_trait::async_trait;
use leadbook_common::api::{DateRange, MessageResponse, NewHistory, NewRecord, NewSupportTicket, RecordUpdate};
use leadbook_common::{HistoryItem, Record, RecordKind, SupportTicket};

use crate::error::ApiError;

pub mod notion;
pub mod sql;

pub use notion::{NotionBackend, NotionDatabases};
pub use sql::SqlBackend;

/// Acknowledgement returned after a support ticket is filed
pub const SUPPORT_TICKET_LOGGED: &str = "Support ticket logged as history";

/// Which history collection an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope {
    /// `/api/history`: interactions with leads
    Leads,
    /// `/api/clients/history`: interactions with clients
    Clients,
}

impl HistoryScope {
    /// Collection the history relation of this scope points into
    pub fn record_kind(self) -> RecordKind {
        match self {
            HistoryScope::Leads => RecordKind::Lead,
            HistoryScope::Clients => RecordKind::Client,
        }
    }
}

/// Title and comment recorded for a support ticket
pub fn support_ticket_note(ticket: &NewSupportTicket) -> (String, String) {
    (
        format!("Support Ticket: {}", ticket.title),
        format!("Priority: {}\n{}", ticket.priority, ticket.description),
    )
}

/// CRM operations shared by every backend
#[async_trait]
pub trait CrmBackend: Send + Sync {
    /// Short backend name for logs and the health endpoint
    fn name(&self) -> &'static str;

    async fn list_leads(&self) -> Result<Vec<Record>, ApiError>;

    async fn create_lead(&self, lead: NewRecord) -> Result<Record, ApiError>;

    /// Apply a partial update; absent fields keep their stored value
    async fn update_lead(&self, id: &str, update: RecordUpdate) -> Result<Record, ApiError>;

    async fn list_clients(&self) -> Result<Vec<Record>, ApiError>;

    async fn create_client(&self, client: NewRecord) -> Result<Record, ApiError>;

    /// History newest first, optionally restricted to a creation-date range
    async fn list_history(&self, scope: HistoryScope, range: DateRange) -> Result<Vec<HistoryItem>, ApiError>;

    async fn add_history(&self, scope: HistoryScope, note: NewHistory) -> Result<HistoryItem, ApiError>;

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>, ApiError>;

    async fn create_support_ticket(&self, ticket: NewSupportTicket) -> Result<MessageResponse, ApiError>;
}
