//! Workspace page normalization
//!
//! Turns pages with operator-chosen property names into the canonical
//! [`Record`], [`HistoryItem`] and [`SupportTicket`] shapes. Every function
//! here is pure and total: absent or mistyped properties fall back to the
//! values in [`defaults`], never to an error.

pub mod defaults;
pub mod property;
pub mod rules;
pub mod schema;

pub use property::{DatabaseSchema, PropertySchema, PropertyValue, WorkspacePage};
pub use schema::{HistorySchema, RecordColumns, RelationWrite};

use crate::models::{ClassColumn, ClassTag, HistoryItem, HistoryKind, Record, RecordKind, SupportTicket};
use rules::Rule;
use std::collections::BTreeMap;

fn field(properties: &BTreeMap<String, PropertyValue>, rules: &[Rule], default: &str) -> String {
    rules::apply(properties, rules).unwrap_or_else(|| default.to_string())
}

/// Split a comma-separated tag string, dropping blanks
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Locate the class column of a page.
///
/// Returns the default column when the page has none, so a later class
/// update still has somewhere to write.
pub fn class_column(page: &WorkspacePage) -> ClassColumn {
    match rules::find_key(&page.properties, rules::is_class_key) {
        Some((key, value)) => ClassColumn {
            name: key.to_string(),
            kind: match value {
                PropertyValue::Select { .. } | PropertyValue::Status { .. } => value.kind(),
                _ => "rich_text",
            }
            .to_string(),
        },
        None => ClassColumn {
            name: defaults::CLASS_COLUMN.to_string(),
            kind: defaults::CLASS_COLUMN_KIND.to_string(),
        },
    }
}

/// Text of the first title property
pub fn page_title(page: &WorkspacePage) -> Option<String> {
    rules::apply(&page.properties, rules::NAME)
}

/// Normalize a lead or client page
pub fn normalize_record(page: &WorkspacePage, kind: RecordKind) -> Record {
    let props = &page.properties;

    let class = rules::apply(props, rules::CLASS)
        .map(|raw| ClassTag::from_loose(&raw))
        .unwrap_or_default();

    let (category, default_status) = match kind {
        RecordKind::Lead => (defaults::LEAD_CATEGORY, defaults::NEW_LEAD_STATUS),
        RecordKind::Client => (defaults::CLIENT_CATEGORY, defaults::ACTIVE_CLIENT_STATUS),
    };

    Record {
        id: page.id.clone(),
        kind,
        name: field(props, rules::NAME, defaults::UNNAMED_RECORD),
        phone: field(props, rules::PHONE, ""),
        address: field(props, rules::ADDRESS, defaults::UNKNOWN_ADDRESS),
        website: field(props, rules::WEBSITE, ""),
        email: rules::apply(props, rules::EMAIL),
        category: Some(category.to_string()),
        class,
        agent: field(props, rules::AGENT, defaults::UNASSIGNED_AGENT),
        status: field(props, rules::STATUS, default_status),
        tags: rules::apply(props, rules::TAGS)
            .map(|raw| split_tags(&raw))
            .unwrap_or_default(),
        created_at: page.created_time.clone(),
        class_column: Some(class_column(page)),
    }
}

/// Normalize an interaction history page
pub fn normalize_history(page: &WorkspacePage) -> HistoryItem {
    let props = &page.properties;

    let title = field(props, rules::HISTORY_TITLE, defaults::DEFAULT_NOTE_TITLE);
    let timestamp = rules::apply(props, rules::HISTORY_DATE)
        .or_else(|| page.created_time.clone())
        .unwrap_or_default();

    let client_id = rules::apply(props, rules::RELATION_ID);
    let client_name = match client_id {
        Some(_) => None,
        None => rules::apply(props, rules::RELATION_NAME),
    };

    HistoryItem {
        id: page.id.clone(),
        kind: HistoryKind::infer(&title),
        title,
        comment: field(props, rules::HISTORY_COMMENT, ""),
        agent: field(props, rules::HISTORY_AGENT, defaults::SYSTEM_AGENT),
        timestamp,
        client_id,
        // Page ids are unique across databases; the caller knows the collection
        related_kind: None,
        client_name,
    }
}

/// Normalize a support ticket page
pub fn normalize_ticket(page: &WorkspacePage) -> SupportTicket {
    let title = ["Name", "Ticket"]
        .iter()
        .find_map(|key| page.property(key).and_then(PropertyValue::first_text))
        .map(str::to_string)
        .or_else(|| page_title(page))
        .unwrap_or_else(|| defaults::UNTITLED_TICKET.to_string());

    let status = ["Status", "Estado"]
        .iter()
        .find_map(|key| page.property(key).and_then(PropertyValue::select_name))
        .unwrap_or(defaults::OPEN_TICKET_STATUS)
        .to_string();

    SupportTicket {
        id: page.id.clone(),
        title,
        status,
        url: page.url.clone(),
        last_edited: page.last_edited_time.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn page(properties: Value) -> WorkspacePage {
        WorkspacePage::from_value(json!({
            "id": "page-1",
            "created_time": "2024-05-02T09:30:00.000Z",
            "last_edited_time": "2024-05-03T11:00:00.000Z",
            "url": "https://www.notion.so/page-1",
            "properties": properties
        }))
        .unwrap()
    }

    #[test]
    fn test_record_without_class_is_c() {
        let record = normalize_record(
            &page(json!({"Name": {"type": "title", "title": [{"plain_text": "Acme"}]}})),
            RecordKind::Lead,
        );
        assert_eq!(record.class, ClassTag::C);
        assert_eq!(
            record.class_column,
            Some(ClassColumn {
                name: "Clase".to_string(),
                kind: "select".to_string()
            })
        );
    }

    #[test]
    fn test_empty_page_gets_placeholders() {
        let record = normalize_record(&page(json!({})), RecordKind::Client);
        assert_eq!(record.name, "Sin Nombre");
        assert_eq!(record.address, "Dirección no especificada");
        assert_eq!(record.agent, "Sin Asignar");
        assert_eq!(record.status, "active");
        assert_eq!(record.category.as_deref(), Some("Cliente"));
        assert_eq!(record.phone, "");
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_record_spanish_columns() {
        let record = normalize_record(
            &page(json!({
                "Empresa": {"type": "title", "title": [{"plain_text": "Transportes Norte"}]},
                "Dirección": {"type": "rich_text", "rich_text": [{"plain_text": "Av. Juárez 10"}]},
                "Teléfono": {"type": "phone_number", "phone_number": "555-0101"},
                "Sitio Web": {"type": "url", "url": "https://norte.mx"},
                "Clase": {"type": "rich_text", "rich_text": [{"plain_text": "a"}]},
                "Responsable": {"type": "select", "select": {"name": "Ana"}},
                "Estado": {"type": "status", "status": {"name": "contactado"}},
                "Etiquetas": {"type": "multi_select", "multi_select": [{"name": "vip"}, {"name": "norte"}]},
                "Correo": {"type": "email", "email": "ventas@norte.mx"}
            })),
            RecordKind::Lead,
        );

        assert_eq!(record.name, "Transportes Norte");
        assert_eq!(record.address, "Av. Juárez 10");
        assert_eq!(record.phone, "555-0101");
        assert_eq!(record.website, "https://norte.mx");
        assert_eq!(record.class, ClassTag::A);
        assert_eq!(record.class_column.unwrap().kind, "rich_text");
        assert_eq!(record.agent, "Ana");
        assert_eq!(record.status, "contactado");
        assert_eq!(record.tags, vec!["vip", "norte"]);
        assert_eq!(record.email.as_deref(), Some("ventas@norte.mx"));
        assert_eq!(record.category.as_deref(), Some("Otros"));
    }

    #[test]
    fn test_history_relation_prefers_named_property() {
        let item = normalize_history(&page(json!({
            "Asesor": {"type": "title", "title": [{"plain_text": "Ana"}]},
            "Cliente": {"type": "relation", "relation": [{"id": "client-7"}]},
            "Aaa Proyecto": {"type": "relation", "relation": [{"id": "project-1"}]}
        })));
        assert_eq!(item.client_id.as_deref(), Some("client-7"));
        assert!(item.client_name.is_none());
    }

    #[test]
    fn test_history_select_fallback_has_no_identifier() {
        let item = normalize_history(&page(json!({
            "Asesor": {"type": "title", "title": [{"plain_text": "Ana"}]},
            "Cliente": {"type": "select", "select": {"name": "Acme"}}
        })));
        assert!(item.client_id.is_none());
        assert_eq!(item.client_name.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_history_rollup_fallback() {
        let item = normalize_history(&page(json!({
            "Nombre Lead": {"type": "rollup", "rollup": {"type": "array", "array": [
                {"type": "title", "title": [{"plain_text": "Ferretería Sol"}]}
            ]}}
        })));
        assert_eq!(item.client_name.as_deref(), Some("Ferretería Sol"));
    }

    #[test]
    fn test_history_fields_and_kind() {
        let item = normalize_history(&page(json!({
            "Asesor": {"type": "title", "title": [{"plain_text": "Luis"}]},
            "Tipo de Contacto": {"type": "select", "select": {"name": "Llamada"}},
            "Comentario": {"type": "rich_text", "rich_text": [{"plain_text": "Interesado"}]},
            "Fecha": {"type": "date", "date": {"start": "2024-05-01"}}
        })));
        assert_eq!(item.agent, "Luis");
        assert_eq!(item.title, "Llamada");
        assert_eq!(item.kind, HistoryKind::Call);
        assert_eq!(item.comment, "Interesado");
        assert_eq!(item.timestamp, "2024-05-01");
    }

    #[test]
    fn test_history_defaults() {
        let item = normalize_history(&page(json!({})));
        assert_eq!(item.agent, "Sistema");
        assert_eq!(item.title, "Nota");
        assert_eq!(item.kind, HistoryKind::Note);
        assert_eq!(item.timestamp, "2024-05-02T09:30:00.000Z");
        assert!(item.client_id.is_none() && item.client_name.is_none());
    }

    #[test]
    fn test_ticket_title_and_status_order() {
        let ticket = normalize_ticket(&page(json!({
            "Asunto": {"type": "title", "title": [{"plain_text": "Impresora"}]},
            "Estado": {"type": "select", "select": {"name": "En curso"}}
        })));
        assert_eq!(ticket.title, "Impresora");
        assert_eq!(ticket.status, "En curso");
        assert_eq!(ticket.url.as_deref(), Some("https://www.notion.so/page-1"));

        let empty = normalize_ticket(&page(json!({})));
        assert_eq!(empty.title, "Sin Título");
        assert_eq!(empty.status, "Abierto");
    }

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags(" a, b ,,c "), vec!["a", "b", "c"]);
        assert!(split_tags("").is_empty());
    }
}
