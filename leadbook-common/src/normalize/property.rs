//! Workspace page and property value types
//!
//! Pages arrive with an operator-defined property set. Each property is
//! decoded leniently: anything that does not fit a known shape becomes
//! [`PropertyValue::Other`] instead of failing the whole page.
//!
//! Properties are held in a `BTreeMap`, so iteration (and therefore
//! "first matching key wins") follows sorted key order rather than
//! whatever order the remote service happened to serialize.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// One segment of a rich-text array
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// Select / status / multi-select option
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

/// Link to another page
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageRef {
    pub id: String,
}

/// Date property payload
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

/// Rollup payload; only the array form carries usable values
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rollup {
    Array {
        #[serde(default)]
        array: Vec<PropertyValue>,
    },
    #[serde(other)]
    Other,
}

/// Typed property value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    Status {
        #[serde(default)]
        status: Option<SelectOption>,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: Vec<SelectOption>,
    },
    Relation {
        #[serde(default)]
        relation: Vec<PageRef>,
    },
    Rollup {
        rollup: Rollup,
    },
    PhoneNumber {
        #[serde(default)]
        phone_number: Option<String>,
    },
    Url {
        #[serde(default)]
        url: Option<String>,
    },
    Email {
        #[serde(default)]
        email: Option<String>,
    },
    Date {
        #[serde(default)]
        date: Option<DateValue>,
    },
    #[serde(other)]
    Other,
}

impl PropertyValue {
    /// Workspace type name of this value
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Title { .. } => "title",
            PropertyValue::RichText { .. } => "rich_text",
            PropertyValue::Select { .. } => "select",
            PropertyValue::Status { .. } => "status",
            PropertyValue::MultiSelect { .. } => "multi_select",
            PropertyValue::Relation { .. } => "relation",
            PropertyValue::Rollup { .. } => "rollup",
            PropertyValue::PhoneNumber { .. } => "phone_number",
            PropertyValue::Url { .. } => "url",
            PropertyValue::Email { .. } => "email",
            PropertyValue::Date { .. } => "date",
            PropertyValue::Other => "other",
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self, PropertyValue::Title { .. })
    }

    pub fn is_relation(&self) -> bool {
        matches!(self, PropertyValue::Relation { .. })
    }

    /// Plain text of the first segment of a title or rich-text value
    pub fn first_text(&self) -> Option<&str> {
        let segments = match self {
            PropertyValue::Title { title } => title,
            PropertyValue::RichText { rich_text } => rich_text,
            _ => return None,
        };
        segments
            .first()
            .map(|s| s.plain_text.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Option name of a select or status value
    pub fn select_name(&self) -> Option<&str> {
        match self {
            PropertyValue::Select { select: Some(opt) }
            | PropertyValue::Status { status: Some(opt) } => {
                Some(opt.name.as_str()).filter(|s| !s.is_empty())
            }
            _ => None,
        }
    }

    /// Linked page ids of a relation value (empty for anything else)
    pub fn relation_ids(&self) -> &[PageRef] {
        match self {
            PropertyValue::Relation { relation } => relation,
            _ => &[],
        }
    }

    /// Start of a date value
    pub fn date_start(&self) -> Option<&str> {
        match self {
            PropertyValue::Date { date: Some(d) } => d.start.as_deref().filter(|s| !s.is_empty()),
            _ => None,
        }
    }
}

/// A page as returned by database queries and page endpoints
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkspacePage {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_edited_time: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: BTreeMap<String, PropertyValue>,
}

impl WorkspacePage {
    /// Build a page from already-decoded JSON
    pub fn from_value(value: Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }
}

/// Column declaration in a database schema
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Database schema as returned by the retrieve-database endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DatabaseSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySchema>,
}

fn lenient_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, PropertyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: BTreeMap<String, Value> = BTreeMap::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let parsed = serde_json::from_value(value).unwrap_or(PropertyValue::Other);
            (key, parsed)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_undecodable_page_is_parse_error() {
        let err = WorkspacePage::from_value(json!(42)).unwrap_err();
        assert!(matches!(err, crate::Error::Parse(_)));
    }

    #[test]
    fn test_decodes_common_property_types() {
        let page = WorkspacePage::from_value(json!({
            "id": "page-1",
            "created_time": "2024-03-01T10:00:00.000Z",
            "properties": {
                "Name": {"id": "title", "type": "title", "title": [{"plain_text": "Acme"}]},
                "Teléfono": {"type": "phone_number", "phone_number": "+52 55 1234"},
                "Clase": {"type": "select", "select": {"name": "A", "color": "red"}},
                "Cliente": {"type": "relation", "relation": [{"id": "c-1"}, {"id": "c-2"}], "has_more": false},
                "Creado": {"type": "created_time", "created_time": "2024-03-01T10:00:00.000Z"}
            }
        }))
        .unwrap();

        assert_eq!(page.property("Name").unwrap().first_text(), Some("Acme"));
        assert_eq!(page.property("Clase").unwrap().select_name(), Some("A"));
        assert_eq!(page.property("Cliente").unwrap().relation_ids().len(), 2);
        assert_eq!(page.property("Creado"), Some(&PropertyValue::Other));
    }

    #[test]
    fn test_malformed_property_becomes_other() {
        let page = WorkspacePage::from_value(json!({
            "id": "page-1",
            "properties": {
                "Name": {"type": "title", "title": null},
                "Broken": "not an object"
            }
        }))
        .unwrap();

        assert_eq!(page.property("Name"), Some(&PropertyValue::Other));
        assert_eq!(page.property("Broken"), Some(&PropertyValue::Other));
    }

    #[test]
    fn test_properties_iterate_in_sorted_order() {
        let page = WorkspacePage::from_value(json!({
            "id": "p",
            "properties": {
                "b": {"type": "url", "url": null},
                "a": {"type": "url", "url": null},
                "C": {"type": "url", "url": null}
            }
        }))
        .unwrap();

        let keys: Vec<&str> = page.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["C", "a", "b"]);
    }

    #[test]
    fn test_rollup_array_decodes_nested_values() {
        let value: PropertyValue = serde_json::from_value(json!({
            "type": "rollup",
            "rollup": {
                "type": "array",
                "array": [{"type": "title", "title": [{"plain_text": "Transportes Norte"}]}],
                "function": "show_original"
            }
        }))
        .unwrap();

        match value {
            PropertyValue::Rollup { rollup: Rollup::Array { array } } => {
                assert_eq!(array[0].first_text(), Some("Transportes Norte"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_values_yield_none() {
        let empty_select = PropertyValue::Select { select: None };
        assert_eq!(empty_select.select_name(), None);

        let blank_text = PropertyValue::RichText {
            rich_text: vec![RichText::default()],
        };
        assert_eq!(blank_text.first_text(), None);
    }

    #[test]
    fn test_database_schema_reads_types_only() {
        let schema: DatabaseSchema = serde_json::from_value(json!({
            "object": "database",
            "properties": {
                "Cliente": {"id": "x", "name": "Cliente", "type": "relation", "relation": {"database_id": "db"}},
                "Asesor": {"id": "title", "name": "Asesor", "type": "title", "title": {}}
            }
        }))
        .unwrap();

        assert_eq!(schema.properties["Cliente"].kind, "relation");
        assert_eq!(schema.properties["Asesor"].kind, "title");
    }
}
