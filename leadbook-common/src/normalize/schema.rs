//! Write-side property encoding
//!
//! The read side tolerates any column naming; writes have to name real
//! columns. Record creation uses a fixed column set. Updates write back to
//! the columns discovered on the existing page, and history creation
//! discovers its columns from the database schema.

use super::defaults;
use super::property::{DatabaseSchema, PropertyValue, WorkspacePage};
use super::rules::{self, KeyPredicate};
use crate::api::types::{NewRecord, RecordUpdate};
use crate::models::ClassColumn;
use serde_json::{json, Map, Value};

/// Property map sent in create/update page bodies
pub type PropertyMap = Map<String, Value>;

fn text_segments(value: &str) -> Value {
    json!([{"type": "text", "text": {"content": value}}])
}

/// Encode `value` as a property of workspace type `kind`.
///
/// Empty strings clear url/phone/email columns. Unknown types are written
/// as rich text.
pub fn encode(kind: &str, value: &str) -> Value {
    let or_null = |v: &str| {
        if v.is_empty() {
            Value::Null
        } else {
            Value::String(v.to_string())
        }
    };

    match kind {
        "title" => json!({"title": text_segments(value)}),
        "select" => json!({"select": {"name": value}}),
        "status" => json!({"status": {"name": value}}),
        "multi_select" => json!({
            "multi_select": super::split_tags(value)
                .into_iter()
                .map(|name| json!({"name": name}))
                .collect::<Vec<_>>()
        }),
        "phone_number" => json!({"phone_number": or_null(value)}),
        "url" => json!({"url": or_null(value)}),
        "email" => json!({"email": or_null(value)}),
        "date" => json!({"date": {"start": value}}),
        _ => json!({"rich_text": text_segments(value)}),
    }
}

/// Properties for a new lead or client page
pub fn record_properties(record: &NewRecord) -> PropertyMap {
    let class = record.class.unwrap_or_default();
    let agent = record
        .agent
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(defaults::UNASSIGNED_AGENT);

    let mut props = PropertyMap::new();
    props.insert(defaults::NAME_COLUMN.into(), encode("title", &record.name));
    props.insert(
        defaults::ADDRESS_COLUMN.into(),
        encode("rich_text", record.address.as_deref().unwrap_or_default()),
    );
    props.insert(
        defaults::PHONE_COLUMN.into(),
        encode("phone_number", record.phone.as_deref().unwrap_or_default()),
    );
    props.insert(
        defaults::WEBSITE_COLUMN.into(),
        encode("url", record.website.as_deref().unwrap_or_default()),
    );
    props.insert(defaults::CLASS_COLUMN.into(), encode("select", class.as_str()));
    props.insert(defaults::AGENT_COLUMN.into(), encode("select", agent));
    props
}

/// A column name with its workspace type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub kind: String,
}

impl Column {
    fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
        }
    }

    fn encode_into(&self, props: &mut PropertyMap, value: &str) {
        props.insert(self.name.clone(), encode(&self.kind, value));
    }
}

/// Columns of an existing record page, used to write partial updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordColumns {
    pub name: Column,
    pub address: Column,
    pub phone: Column,
    pub website: Column,
    pub class: Column,
    pub agent: Column,
    /// Status is written only when the page already has a status column
    pub status: Option<Column>,
}

fn discover_column(page: &WorkspacePage, matches: KeyPredicate) -> Option<Column> {
    rules::find_key(&page.properties, matches).map(|(key, value)| {
        let kind = match value {
            // Formula/rollup and other read-only types cannot be written;
            // text is the closest writable form.
            PropertyValue::Other | PropertyValue::Rollup { .. } => "rich_text",
            other => other.kind(),
        };
        Column::new(key, kind)
    })
}

impl RecordColumns {
    /// Locate each writable column on `page`, falling back to the creation
    /// column names when the page does not have one.
    pub fn discover(page: &WorkspacePage) -> Self {
        let ClassColumn { name, kind } = super::class_column(page);
        Self {
            name: discover_column(page, rules::is_title)
                .unwrap_or_else(|| Column::new(defaults::NAME_COLUMN, "title")),
            address: discover_column(page, rules::is_address_key)
                .unwrap_or_else(|| Column::new(defaults::ADDRESS_COLUMN, "rich_text")),
            phone: discover_column(page, rules::is_phone_key)
                .unwrap_or_else(|| Column::new(defaults::PHONE_COLUMN, "phone_number")),
            website: discover_column(page, rules::is_website_key)
                .unwrap_or_else(|| Column::new(defaults::WEBSITE_COLUMN, "url")),
            class: Column { name, kind },
            agent: discover_column(page, rules::is_agent_key)
                .unwrap_or_else(|| Column::new(defaults::AGENT_COLUMN, "select")),
            status: discover_column(page, rules::is_status_key),
        }
    }

    /// Properties for a partial update; absent fields are not touched
    pub fn update_properties(&self, update: &RecordUpdate) -> PropertyMap {
        let mut props = PropertyMap::new();
        if let Some(name) = &update.name {
            self.name.encode_into(&mut props, name);
        }
        if let Some(address) = &update.address {
            self.address.encode_into(&mut props, address);
        }
        if let Some(phone) = &update.phone {
            self.phone.encode_into(&mut props, phone);
        }
        if let Some(website) = &update.website {
            self.website.encode_into(&mut props, website);
        }
        if let Some(class) = update.class {
            self.class.encode_into(&mut props, class.as_str());
        }
        if let Some(agent) = &update.agent {
            self.agent.encode_into(&mut props, agent);
        }
        if let (Some(status), Some(column)) = (&update.status, &self.status) {
            column.encode_into(&mut props, status);
        }
        props
    }
}

/// How the relation column of a new history entry is filled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationWrite {
    /// Link to the related page
    Link(String),
    /// Write the related record's display name into a text column
    Name(String),
    /// Leave the relation empty
    Skip,
}

/// Columns of a history database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySchema {
    pub title: String,
    pub relation: Option<Column>,
    /// Interaction type; encoded by the column's own type
    pub contact: Column,
    pub comment: Column,
    pub date: Option<String>,
}

impl HistorySchema {
    /// Discover history columns from a database schema
    pub fn discover(schema: &DatabaseSchema) -> Self {
        let props = &schema.properties;
        let first_key = |matches: &dyn Fn(&str, &str) -> bool| {
            props
                .iter()
                .find(|(key, column)| matches(key.as_str(), column.kind.as_str()))
                .map(|(key, _)| key.clone())
        };
        let text_column = |matches: &dyn Fn(&str) -> bool, fallback: &str| {
            props
                .iter()
                .find(|(key, _)| matches(key.as_str()))
                .map(|(key, column)| Column::new(key, &column.kind))
                .unwrap_or_else(|| Column::new(fallback, "rich_text"))
        };

        let relation = first_key(&|_, kind| kind == "relation")
            .or_else(|| {
                props
                    .contains_key(defaults::HISTORY_RELATION_COLUMN)
                    .then(|| defaults::HISTORY_RELATION_COLUMN.to_string())
            })
            .map(|key| {
                let kind = props[&key].kind.clone();
                Column { name: key, kind }
            });

        Self {
            title: first_key(&|_, kind| kind == "title")
                .unwrap_or_else(|| defaults::HISTORY_TITLE_COLUMN.to_string()),
            relation,
            contact: text_column(&rules::names_contact, defaults::HISTORY_CONTACT_COLUMN),
            comment: text_column(&rules::names_comment, defaults::HISTORY_COMMENT_COLUMN),
            date: first_key(&|key, _| rules::names_date(key)),
        }
    }

    /// The relation column takes a page link
    pub fn links_relation(&self) -> bool {
        matches!(&self.relation, Some(column) if column.kind == "relation")
    }

    /// The relation column takes the related record's name as text
    pub fn names_relation(&self) -> bool {
        matches!(&self.relation, Some(column) if column.kind == "rich_text" || column.kind == "title")
    }

    /// Properties for a new history page
    pub fn properties(
        &self,
        agent: &str,
        relation: RelationWrite,
        interaction: &str,
        text: &str,
        now: &str,
    ) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert(self.title.clone(), encode("title", agent));

        if let Some(column) = &self.relation {
            match relation {
                RelationWrite::Link(id) => {
                    props.insert(column.name.clone(), json!({"relation": [{"id": id}]}));
                }
                RelationWrite::Name(name) => {
                    props.insert(column.name.clone(), encode(&column.kind, &name));
                }
                RelationWrite::Skip => {}
            }
        }

        self.contact.encode_into(&mut props, interaction);
        self.comment.encode_into(&mut props, text);
        if let Some(date) = &self.date {
            props.insert(date.clone(), encode("date", now));
        }
        props
    }
}
