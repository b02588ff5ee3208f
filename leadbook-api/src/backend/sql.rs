//! SQLite backend
//!
//! Leads and clients live in twin tables; history rows point at either one.
//! Support tickets have no table of their own: they are history rows of
//! type `Support`.

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use leadbook_common::api::{DateRange, MessageResponse, NewHistory, NewRecord, NewSupportTicket, RecordUpdate};
use leadbook_common::models::ClassTag;
use leadbook_common::normalize::defaults;
use leadbook_common::normalize::split_tags;
use leadbook_common::{HistoryItem, HistoryKind, Record, RecordKind, SupportTicket};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use super::{support_ticket_note, CrmBackend, HistoryScope, SUPPORT_TICKET_LOGGED};
use crate::error::ApiError;

/// History type stored for support tickets
const SUPPORT_TYPE: &str = "Support";

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn table(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Lead => "leads",
        RecordKind::Client => "clients",
    }
}

/// Parse a numeric row id from a path or body field
fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} id: {}", what, raw)))
}

fn parse_optional_id(raw: &Option<String>, what: &str) -> Result<Option<i64>, ApiError> {
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => parse_id(id, what).map(Some),
        None => Ok(None),
    }
}

/// Widen a bare `YYYY-MM-DD` upper bound to the end of that day
fn end_of_day(bound: &str) -> String {
    if bound.len() == 10 {
        format!("{}T23:59:59.999Z", bound)
    } else {
        bound.to_string()
    }
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: i64,
    name: String,
    phone: String,
    address: String,
    website: String,
    email: Option<String>,
    category: Option<String>,
    clase: String,
    agent: String,
    status: String,
    tags: String,
    created_at: String,
}

impl RecordRow {
    fn into_record(self, kind: RecordKind) -> Record {
        Record {
            id: self.id.to_string(),
            kind,
            name: self.name,
            phone: self.phone,
            address: self.address,
            website: self.website,
            email: self.email,
            category: self.category,
            class: ClassTag::from_loose(&self.clase),
            agent: self.agent,
            status: self.status,
            tags: split_tags(&self.tags),
            created_at: Some(self.created_at),
            class_column: None,
        }
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: i64,
    title: String,
    #[sqlx(rename = "type")]
    kind: String,
    comment: String,
    agent: String,
    lead_id: Option<i64>,
    client_id: Option<i64>,
    created_at: String,
}

impl From<HistoryRow> for HistoryItem {
    fn from(row: HistoryRow) -> Self {
        let (client_id, related_kind) = match (row.client_id, row.lead_id) {
            (Some(id), _) => (Some(id.to_string()), Some(RecordKind::Client)),
            (None, Some(id)) => (Some(id.to_string()), Some(RecordKind::Lead)),
            (None, None) => (None, None),
        };
        HistoryItem {
            id: row.id.to_string(),
            kind: HistoryKind::infer(&row.kind),
            title: row.title,
            comment: row.comment,
            agent: row.agent,
            timestamp: row.created_at,
            client_id,
            related_kind,
            client_name: None,
        }
    }
}

const RECORD_COLUMNS: &str =
    "id, name, phone, address, website, email, category, clase, agent, status, tags, created_at";

const HISTORY_COLUMNS: &str = "id, title, type, comment, agent, lead_id, client_id, created_at";

/// Backend over the local SQLite database
#[derive(Clone)]
pub struct SqlBackend {
    pool: SqlitePool,
}

impl SqlBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn list_records(&self, kind: RecordKind) -> Result<Vec<Record>, ApiError> {
        let order = match kind {
            RecordKind::Lead => "created_at DESC, id DESC",
            RecordKind::Client => "name COLLATE NOCASE ASC, id ASC",
        };
        let sql = format!("SELECT {} FROM {} ORDER BY {}", RECORD_COLUMNS, table(kind), order);

        let rows: Vec<RecordRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(|r| r.into_record(kind)).collect())
    }

    async fn fetch_record(&self, kind: RecordKind, id: i64) -> Result<Record, ApiError> {
        let sql = format!("SELECT {} FROM {} WHERE id = ?", RECORD_COLUMNS, table(kind));
        let row: Option<RecordRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_record(kind))
            .ok_or_else(|| ApiError::NotFound(format!("{} {} not found", table(kind), id)))
    }

    async fn insert_record(&self, kind: RecordKind, record: NewRecord) -> Result<Record, ApiError> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("name is required".to_string()));
        }

        let default_status = match kind {
            RecordKind::Lead => defaults::NEW_LEAD_STATUS,
            RecordKind::Client => defaults::ACTIVE_CLIENT_STATUS,
        };
        let agent = record
            .agent
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| defaults::UNASSIGNED_AGENT.to_string());
        let tags = record
            .tags
            .unwrap_or_default()
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",");

        let sql = format!(
            "INSERT INTO {} (name, phone, address, website, email, category, clase, agent, status, tags, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            table(kind)
        );
        let result = sqlx::query(&sql)
            .bind(name)
            .bind(record.phone.unwrap_or_default())
            .bind(record.address.unwrap_or_default())
            .bind(record.website.unwrap_or_default())
            .bind(record.email)
            .bind(record.category)
            .bind(record.class.unwrap_or_default().as_str())
            .bind(agent)
            .bind(record.status.unwrap_or_else(|| default_status.to_string()))
            .bind(tags)
            .bind(now())
            .execute(&self.pool)
            .await?;

        let id = result.last_insert_rowid();
        info!("Created {} {} ({})", table(kind), id, name);
        self.fetch_record(kind, id).await
    }

    /// 404 unless `id` is a row of `kind`'s table
    async fn ensure_exists(&self, kind: RecordKind, id: i64) -> Result<(), ApiError> {
        let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", table(kind));
        let exists: bool = sqlx::query_scalar(&sql).bind(id).fetch_one(&self.pool).await?;
        if exists {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("{} {} not found", table(kind), id)))
        }
    }

    async fn insert_history(
        &self,
        title: &str,
        kind: &str,
        comment: &str,
        agent: &str,
        lead_id: Option<i64>,
        client_id: Option<i64>,
    ) -> Result<HistoryItem, ApiError> {
        if let Some(id) = lead_id {
            self.ensure_exists(RecordKind::Lead, id).await?;
        }
        if let Some(id) = client_id {
            self.ensure_exists(RecordKind::Client, id).await?;
        }

        let result = sqlx::query(
            "INSERT INTO history (title, type, comment, agent, lead_id, client_id, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(title)
        .bind(kind)
        .bind(comment)
        .bind(agent)
        .bind(lead_id)
        .bind(client_id)
        .bind(now())
        .execute(&self.pool)
        .await?;

        let row: HistoryRow = sqlx::query_as(&format!(
            "SELECT {} FROM history WHERE id = ?",
            HISTORY_COLUMNS
        ))
        .bind(result.last_insert_rowid())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }
}

#[async_trait]
impl CrmBackend for SqlBackend {
    fn name(&self) -> &'static str {
        "sql"
    }

    async fn list_leads(&self) -> Result<Vec<Record>, ApiError> {
        self.list_records(RecordKind::Lead).await
    }

    async fn create_lead(&self, lead: NewRecord) -> Result<Record, ApiError> {
        self.insert_record(RecordKind::Lead, lead).await
    }

    async fn update_lead(&self, id: &str, update: RecordUpdate) -> Result<Record, ApiError> {
        let id = parse_id(id, "lead")?;
        if update.is_empty() {
            debug!("Empty update for lead {}", id);
            return self.fetch_record(RecordKind::Lead, id).await;
        }

        let result = sqlx::query(
            "UPDATE leads SET \
                name = COALESCE(?, name), \
                phone = COALESCE(?, phone), \
                address = COALESCE(?, address), \
                website = COALESCE(?, website), \
                clase = COALESCE(?, clase), \
                agent = COALESCE(?, agent), \
                status = COALESCE(?, status) \
             WHERE id = ?",
        )
        .bind(update.name)
        .bind(update.phone)
        .bind(update.address)
        .bind(update.website)
        .bind(update.class.map(|c| c.as_str()))
        .bind(update.agent)
        .bind(update.status)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("leads {} not found", id)));
        }
        self.fetch_record(RecordKind::Lead, id).await
    }

    async fn list_clients(&self) -> Result<Vec<Record>, ApiError> {
        self.list_records(RecordKind::Client).await
    }

    async fn create_client(&self, client: NewRecord) -> Result<Record, ApiError> {
        self.insert_record(RecordKind::Client, client).await
    }

    async fn list_history(&self, scope: HistoryScope, range: DateRange) -> Result<Vec<HistoryItem>, ApiError> {
        let mut query: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM history WHERE 1 = 1", HISTORY_COLUMNS));

        if scope == HistoryScope::Clients {
            query.push(" AND client_id IS NOT NULL");
        }
        if let Some(start) = range.start_date.filter(|s| !s.is_empty()) {
            query.push(" AND created_at >= ").push_bind(start);
        }
        if let Some(end) = range.end_date.filter(|s| !s.is_empty()) {
            query.push(" AND created_at <= ").push_bind(end_of_day(&end));
        }
        query.push(" ORDER BY created_at DESC, id DESC");

        let rows: Vec<HistoryRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(HistoryItem::from).collect())
    }

    async fn add_history(&self, scope: HistoryScope, note: NewHistory) -> Result<HistoryItem, ApiError> {
        let mut lead_id = parse_optional_id(&note.lead_id, "lead")?;
        let mut client_id = parse_optional_id(&note.client_id, "client")?;

        // The clients endpoint only ever relates to clients
        if scope == HistoryScope::Clients && client_id.is_none() {
            client_id = lead_id.take();
        }

        let title = note
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(note.interaction_type.as_str());

        self.insert_history(
            title,
            &note.interaction_type,
            &note.text,
            &note.agent,
            lead_id,
            client_id,
        )
        .await
    }

    async fn list_support_tickets(&self) -> Result<Vec<SupportTicket>, ApiError> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "SELECT {} FROM history \
             WHERE type = ? OR title LIKE '%Support Ticket%' \
             ORDER BY created_at DESC, id DESC",
            HISTORY_COLUMNS
        ))
        .bind(SUPPORT_TYPE)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| SupportTicket {
                id: row.id.to_string(),
                title: row.title,
                status: defaults::OPEN_TICKET_STATUS.to_string(),
                url: None,
                last_edited: Some(row.created_at),
            })
            .collect())
    }

    async fn create_support_ticket(&self, ticket: NewSupportTicket) -> Result<MessageResponse, ApiError> {
        info!(
            title = %ticket.title,
            priority = %ticket.priority,
            client_id = ?ticket.client_id,
            "Support ticket received"
        );

        if let Some(client_id) = parse_optional_id(&ticket.client_id, "client")? {
            let (title, comment) = support_ticket_note(&ticket);
            self.insert_history(
                &title,
                SUPPORT_TYPE,
                &comment,
                defaults::SYSTEM_AGENT,
                None,
                Some(client_id),
            )
            .await?;
        }

        Ok(MessageResponse {
            message: SUPPORT_TICKET_LOGGED.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    async fn backend() -> SqlBackend {
        SqlBackend::new(init_memory_database().await.unwrap())
    }

    fn new_record(name: &str) -> NewRecord {
        NewRecord {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_lead_defaults() {
        let backend = backend().await;
        let lead = backend.create_lead(new_record("Acme")).await.unwrap();

        assert_eq!(lead.name, "Acme");
        assert_eq!(lead.class, ClassTag::C);
        assert_eq!(lead.agent, "Sin Asignar");
        assert_eq!(lead.status, "new");
        assert_eq!(lead.kind, RecordKind::Lead);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let backend = backend().await;
        let err = backend.create_lead(new_record("  ")).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_class_only_update() {
        let backend = backend().await;
        let lead = backend
            .create_lead(NewRecord {
                name: "Acme".to_string(),
                phone: Some("555".to_string()),
                agent: Some("Ana".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = backend
            .update_lead(
                &lead.id,
                RecordUpdate {
                    class: Some(ClassTag::A),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.class, ClassTag::A);
        assert_eq!(
            Record {
                class: ClassTag::C,
                ..updated
            },
            lead
        );
    }

    #[tokio::test]
    async fn test_update_unknown_lead_is_not_found() {
        let backend = backend().await;
        let err = backend
            .update_lead(
                "99",
                RecordUpdate {
                    status: Some("won".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = backend
            .update_lead("abc", RecordUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_clients_sorted_by_name() {
        let backend = backend().await;
        for name in ["zeta", "Alfa", "beta"] {
            backend.create_client(new_record(name)).await.unwrap();
        }
        let names: Vec<String> = backend
            .list_clients()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Alfa", "beta", "zeta"]);
    }

    #[tokio::test]
    async fn test_client_tags_round_trip_through_storage() {
        let backend = backend().await;
        let client = backend
            .create_client(NewRecord {
                name: "Acme".to_string(),
                tags: Some(vec!["vip".to_string(), " norte ".to_string()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(client.tags, vec!["vip", "norte"]);
        assert_eq!(client.status, "active");
    }

    #[tokio::test]
    async fn test_history_newest_first_and_scoped() {
        let backend = backend().await;
        let lead = backend.create_lead(new_record("Acme")).await.unwrap();
        let client = backend.create_client(new_record("Sol")).await.unwrap();

        backend
            .add_history(
                HistoryScope::Leads,
                NewHistory {
                    text: "primera".to_string(),
                    agent: "Ana".to_string(),
                    interaction_type: "Llamada".to_string(),
                    lead_id: Some(lead.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = backend
            .add_history(
                HistoryScope::Clients,
                NewHistory {
                    text: "segunda".to_string(),
                    agent: "Ana".to_string(),
                    interaction_type: "email".to_string(),
                    client_id: Some(client.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(second.kind, HistoryKind::Email);
        assert_eq!(second.client_id.as_deref(), Some(client.id.as_str()));

        let all = backend
            .list_history(HistoryScope::Leads, DateRange::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].comment, "segunda");
        assert_eq!(all[1].kind, HistoryKind::Call);
        assert_eq!(all[1].client_id.as_deref(), Some(lead.id.as_str()));

        let clients_only = backend
            .list_history(HistoryScope::Clients, DateRange::default())
            .await
            .unwrap();
        assert_eq!(clients_only.len(), 1);
    }

    #[tokio::test]
    async fn test_history_date_range() {
        let backend = backend().await;
        backend
            .add_history(
                HistoryScope::Leads,
                NewHistory {
                    text: "hoy".to_string(),
                    agent: "Ana".to_string(),
                    interaction_type: "note".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let past = backend
            .list_history(
                HistoryScope::Leads,
                DateRange {
                    start_date: None,
                    end_date: Some("2000-01-01".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(past.is_empty());

        let since = backend
            .list_history(
                HistoryScope::Leads,
                DateRange {
                    start_date: Some("2000-01-01".to_string()),
                    end_date: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(since.len(), 1);
    }

    #[tokio::test]
    async fn test_support_ticket_logged_as_history() {
        let backend = backend().await;
        let client = backend.create_client(new_record("Sol")).await.unwrap();

        let ack = backend
            .create_support_ticket(NewSupportTicket {
                title: "No imprime".to_string(),
                description: "Error 42".to_string(),
                priority: "Alta".to_string(),
                client_id: Some(client.id.clone()),
            })
            .await
            .unwrap();
        assert_eq!(ack.message, "Support ticket logged as history");

        // without a client nothing is stored
        backend
            .create_support_ticket(NewSupportTicket {
                title: "Anónimo".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let tickets = backend.list_support_tickets().await.unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].title, "Support Ticket: No imprime");
        assert_eq!(tickets[0].status, "Abierto");
    }

    #[tokio::test]
    async fn test_history_for_unknown_record_is_not_found() {
        let backend = backend().await;
        backend.create_lead(new_record("Acme")).await.unwrap();

        let err = backend
            .add_history(
                HistoryScope::Clients,
                NewHistory {
                    text: "x".to_string(),
                    agent: "Ana".to_string(),
                    interaction_type: "Nota".to_string(),
                    client_id: Some("1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "clients 1 not found");

        let err = backend
            .create_support_ticket(NewSupportTicket {
                title: "x".to_string(),
                client_id: Some("7".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(backend.list_support_tickets().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_ids_keep_their_collection() {
        let backend = backend().await;
        let lead = backend.create_lead(new_record("Acme Lead")).await.unwrap();
        let client = backend.create_client(new_record("Sol Client")).await.unwrap();
        assert_eq!(lead.id, client.id);

        let client_note = backend
            .add_history(
                HistoryScope::Clients,
                NewHistory {
                    text: "pedido".to_string(),
                    agent: "Ana".to_string(),
                    interaction_type: "Nota".to_string(),
                    client_id: Some(client.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let lead_note = backend
            .add_history(
                HistoryScope::Leads,
                NewHistory {
                    text: "llamada".to_string(),
                    agent: "Ana".to_string(),
                    interaction_type: "Llamada".to_string(),
                    lead_id: Some(lead.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(client_note.relates_to(RecordKind::Client, &client.id));
        assert!(!client_note.relates_to(RecordKind::Lead, &lead.id));
        assert!(lead_note.relates_to(RecordKind::Lead, &lead.id));
        assert!(!lead_note.relates_to(RecordKind::Client, &client.id));
    }

    #[test]
    fn test_end_of_day() {
        assert_eq!(end_of_day("2024-01-31"), "2024-01-31T23:59:59.999Z");
        assert_eq!(end_of_day("2024-01-31T10:00:00Z"), "2024-01-31T10:00:00Z");
    }
}
