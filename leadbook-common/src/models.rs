//! Canonical data model
//!
//! Both backends (SQL and workspace) produce these shapes, and the client
//! store consumes them. Field names serialize in camelCase to match the
//! SPA; the class tag keeps its historical wire name `clase`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse priority tier assigned to a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ClassTag {
    A,
    B,
    #[default]
    C,
}

impl ClassTag {
    /// Lenient conversion used when reading foreign data.
    ///
    /// Anything that is not recognisably A or B (after trimming, any case)
    /// collapses to the lowest tier.
    pub fn from_loose(raw: &str) -> ClassTag {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A" => ClassTag::A,
            "B" => ClassTag::B,
            _ => ClassTag::C,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ClassTag::A => "A",
            ClassTag::B => "B",
            ClassTag::C => "C",
        }
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which collection a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Lead,
    Client,
}

/// Where the class tag lives on a workspace page, so writes go back to the
/// column it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassColumn {
    pub name: String,
    /// Workspace property type (`select` or `rich_text`)
    pub kind: String,
}

/// A lead or client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub kind: RecordKind,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "clase")]
    pub class: ClassTag,
    pub agent: String,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_column: Option<ClassColumn>,
}

/// Interaction type of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Call,
    Email,
    Meeting,
    #[default]
    Note,
}

impl HistoryKind {
    /// Infer the interaction type from a free-text label.
    ///
    /// Exact canonical names are honoured first. Otherwise phone words map
    /// to `Call` and mail/messaging words to `Email`; when both appear the
    /// mail match wins.
    pub fn infer(label: &str) -> HistoryKind {
        let lower = label.trim().to_lowercase();
        match lower.as_str() {
            "call" => return HistoryKind::Call,
            "email" => return HistoryKind::Email,
            "meeting" => return HistoryKind::Meeting,
            "note" => return HistoryKind::Note,
            _ => {}
        }

        let mut kind = HistoryKind::Note;
        if lower.contains("llamada") || lower.contains("tel") {
            kind = HistoryKind::Call;
        }
        if lower.contains("mail") || lower.contains("correo") || lower.contains("what") {
            kind = HistoryKind::Email;
        }
        kind
    }
}

/// A logged interaction, optionally related to one record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    pub title: String,
    pub comment: String,
    pub agent: String,
    /// ISO-8601 timestamp as stored by the backend
    pub timestamp: String,
    /// Id of the related record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Collection `client_id` belongs to. `None` only when ids are unique
    /// across both collections, as workspace page ids are.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_kind: Option<RecordKind>,
    /// Display-only name used when no identifier could be resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

impl HistoryItem {
    /// Whether this item is related to record `id` of collection `kind`
    pub fn relates_to(&self, kind: RecordKind, id: &str) -> bool {
        self.client_id.as_deref() == Some(id) && self.related_kind.map_or(true, |k| k == kind)
    }
}

/// Support ticket summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportTicket {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_tag_from_loose() {
        assert_eq!(ClassTag::from_loose("A"), ClassTag::A);
        assert_eq!(ClassTag::from_loose(" b "), ClassTag::B);
        assert_eq!(ClassTag::from_loose("c"), ClassTag::C);
        assert_eq!(ClassTag::from_loose("Premium"), ClassTag::C);
        assert_eq!(ClassTag::from_loose(""), ClassTag::C);
    }

    #[test]
    fn test_class_tag_strict_deserialization() {
        let tag: ClassTag = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(tag, ClassTag::A);
        assert!(serde_json::from_str::<ClassTag>("\"D\"").is_err());
    }

    #[test]
    fn test_history_kind_inference() {
        assert_eq!(HistoryKind::infer("Llamada de seguimiento"), HistoryKind::Call);
        assert_eq!(HistoryKind::infer("Teléfono"), HistoryKind::Call);
        assert_eq!(HistoryKind::infer("Correo enviado"), HistoryKind::Email);
        assert_eq!(HistoryKind::infer("WhatsApp"), HistoryKind::Email);
        assert_eq!(HistoryKind::infer("Visita"), HistoryKind::Note);
        assert_eq!(HistoryKind::infer("meeting"), HistoryKind::Meeting);
    }

    #[test]
    fn test_history_kind_mail_wins_over_phone() {
        // "tel" and "mail" both present
        assert_eq!(HistoryKind::infer("Tel + email"), HistoryKind::Email);
    }

    #[test]
    fn test_record_serializes_class_as_clase() {
        let record = Record {
            id: "1".to_string(),
            kind: RecordKind::Lead,
            name: "Acme".to_string(),
            phone: String::new(),
            address: String::new(),
            website: String::new(),
            email: None,
            category: None,
            class: ClassTag::B,
            agent: "Ana".to_string(),
            status: "new".to_string(),
            tags: vec![],
            created_at: None,
            class_column: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["clase"], "B");
        assert_eq!(json["kind"], "lead");
        assert!(json.get("email").is_none());
    }

    #[test]
    fn test_history_relation_is_typed() {
        let item: HistoryItem = serde_json::from_value(serde_json::json!({
            "id": "9",
            "type": "note",
            "title": "Nota",
            "comment": "",
            "agent": "Ana",
            "timestamp": "2024-01-01T00:00:00Z",
            "clientId": "1",
            "relatedKind": "client"
        }))
        .unwrap();

        assert!(item.relates_to(RecordKind::Client, "1"));
        assert!(!item.relates_to(RecordKind::Lead, "1"));
        assert!(!item.relates_to(RecordKind::Client, "2"));

        let untyped = HistoryItem {
            related_kind: None,
            ..item
        };
        assert!(untyped.relates_to(RecordKind::Lead, "1"));
        assert!(untyped.relates_to(RecordKind::Client, "1"));
    }
}
