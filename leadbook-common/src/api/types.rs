//! Shared API request/response types
//!
//! Request bodies are strict: unknown fields are rejected and required
//! fields have no silent defaults. Optional fields document their default
//! where the service applies one.

use crate::models::ClassTag;
use serde::{Deserialize, Serialize};

// ========================================
// Record Types
// ========================================

/// Body of `POST /api/leads` and `POST /api/clients`
///
/// # Examples
///
/// ```
/// use leadbook_common::api::types::NewRecord;
///
/// let lead: NewRecord = serde_json::from_str(r#"{"name": "Acme", "clase": "A"}"#).unwrap();
/// assert_eq!(lead.name, "Acme");
/// assert!(lead.phone.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Defaults to `C`
    #[serde(rename = "clase", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassTag>,
    /// Defaults to the unassigned placeholder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Body of `PUT /api/leads/:id`
///
/// Absent fields are left untouched by the update.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RecordUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(rename = "clase", default, skip_serializing_if = "Option::is_none")]
    pub class: Option<ClassTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RecordUpdate {
    /// True when the update would not change anything
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.website.is_none()
            && self.class.is_none()
            && self.agent.is_none()
            && self.status.is_none()
    }
}

// ========================================
// History Types
// ========================================

/// Body of `POST /api/history` and `POST /api/clients/history`
///
/// `leadId` and `clientId` are interchangeable for the workspace backend;
/// the SQL backend stores them in separate columns.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewHistory {
    /// Free-text comment
    pub text: String,
    pub agent: String,
    /// Operator label such as "Llamada" or "Correo"
    pub interaction_type: String,
    /// Defaults to the interaction type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl NewHistory {
    /// The related record identifier, client taking precedence over lead
    pub fn related_id(&self) -> Option<&str> {
        non_blank(&self.client_id).or_else(|| non_blank(&self.lead_id))
    }
}

fn non_blank(id: &Option<String>) -> Option<&str> {
    id.as_deref().filter(|id| !id.trim().is_empty())
}

/// Query parameters of the history listing endpoints
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

// ========================================
// Support Types
// ========================================

/// Body of `POST /api/support-tickets`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewSupportTicket {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

// ========================================
// AI / Auth Types
// ========================================

/// Body of `POST /api/ai/generate-leads`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateLeadsRequest {
    pub location: String,
}

/// Body of `POST /api/auth/google`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GoogleAuthRequest {
    pub token: String,
}

/// Signed-in user returned by the auth endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AuthUser {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Successful auth response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GoogleAuthResponse {
    pub success: bool,
    pub user: AuthUser,
}

// ========================================
// Generic Responses
// ========================================

/// Plain acknowledgement body
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_rejects_unknown_fields() {
        let result = serde_json::from_str::<NewRecord>(r#"{"name": "Acme", "color": "red"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_record_requires_name() {
        let result = serde_json::from_str::<NewRecord>(r#"{"phone": "555"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_update_class_only() {
        let update: RecordUpdate = serde_json::from_str(r#"{"clase": "A"}"#).unwrap();
        assert_eq!(update.class, Some(ClassTag::A));
        assert!(update.name.is_none());
        assert!(!update.is_empty());
        assert!(RecordUpdate::default().is_empty());
    }

    #[test]
    fn test_record_update_rejects_bad_class() {
        assert!(serde_json::from_str::<RecordUpdate>(r#"{"clase": "Z"}"#).is_err());
    }

    #[test]
    fn test_new_history_related_id_prefers_client() {
        let note: NewHistory = serde_json::from_str(
            r#"{"text": "hola", "agent": "Ana", "interactionType": "Llamada", "leadId": "l-1", "clientId": "c-1"}"#,
        )
        .unwrap();
        assert_eq!(note.related_id(), Some("c-1"));

        let note = NewHistory {
            lead_id: Some("l-1".to_string()),
            client_id: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(note.related_id(), Some("l-1"));
        assert_eq!(NewHistory::default().related_id(), None);
    }

    #[test]
    fn test_new_history_requires_interaction_type() {
        let result = serde_json::from_str::<NewHistory>(r#"{"text": "hola", "agent": "Ana"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_error_response_omits_empty_message() {
        let body = ErrorResponse {
            error: "Invalid Token".to_string(),
            message: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"error":"Invalid Token"}"#);
    }
}
