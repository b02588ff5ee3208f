//! Field inference rules
//!
//! A rule pairs a key predicate with an extractor. For a field, rules are
//! tried in declared order: the first key (in sorted order) satisfying the
//! predicate is selected, and if the extractor recovers a value from it
//! that value wins. Otherwise the next rule is tried. When every rule
//! fails the caller applies the field's default from [`super::defaults`].

use super::property::{PropertyValue, Rollup};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Decides whether a property is a candidate for a field
pub type KeyPredicate = fn(&str, &PropertyValue) -> bool;

/// Recovers a field value from a candidate property
pub type Extractor = fn(&PropertyValue) -> Option<String>;

/// One (predicate, extractor) pair
#[derive(Clone, Copy)]
pub struct Rule {
    pub label: &'static str,
    pub matches: KeyPredicate,
    pub extract: Extractor,
}

/// First property satisfying `matches`, in sorted key order
pub fn find_key<'a>(
    properties: &'a BTreeMap<String, PropertyValue>,
    matches: KeyPredicate,
) -> Option<(&'a str, &'a PropertyValue)> {
    properties
        .iter()
        .find(|(key, value)| matches(key, value))
        .map(|(key, value)| (key.as_str(), value))
}

/// Evaluate `rules` in order and return the first recovered value
pub fn apply(properties: &BTreeMap<String, PropertyValue>, rules: &[Rule]) -> Option<String> {
    rules.iter().find_map(|rule| {
        let (key, value) = find_key(properties, rule.matches)?;
        let extracted = (rule.extract)(value);
        tracing::trace!(field = rule.label, key, found = extracted.is_some(), "rule matched");
        extracted
    })
}

// ========================================
// Key patterns
// ========================================

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("valid key pattern")
}

static ADDRESS_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)address|direcci|ubicaci"));
static PHONE_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)phone|tel"));
static WEBSITE_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)web|url"));
static EMAIL_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)e-?mail|correo"));
static CLASS_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)clase|class"));
static AGENT_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)responsable|agent"));
static STATUS_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)status|estado"));
static TAGS_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)tags|etiqueta"));
static CONTACT_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)contacto|prospeccion"));
static COMMENT_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)comentario|detalle|descri"));
static DATE_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)fecha|date"));
static RELATION_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)cliente|empresa|lead|relation"));
static RELATED_NAME_KEY: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)cliente|empresa|lead"));

pub fn is_title(_key: &str, value: &PropertyValue) -> bool {
    value.is_title()
}

pub fn is_relation(_key: &str, value: &PropertyValue) -> bool {
    value.is_relation()
}

pub fn is_address_key(key: &str, _value: &PropertyValue) -> bool {
    ADDRESS_KEY.is_match(key)
}

pub fn is_phone_key(key: &str, _value: &PropertyValue) -> bool {
    PHONE_KEY.is_match(key)
}

pub fn is_website_key(key: &str, _value: &PropertyValue) -> bool {
    WEBSITE_KEY.is_match(key)
}

pub fn is_email_key(key: &str, _value: &PropertyValue) -> bool {
    EMAIL_KEY.is_match(key)
}

pub fn is_class_key(key: &str, _value: &PropertyValue) -> bool {
    CLASS_KEY.is_match(key)
}

pub fn is_agent_key(key: &str, _value: &PropertyValue) -> bool {
    AGENT_KEY.is_match(key)
}

pub fn is_status_key(key: &str, _value: &PropertyValue) -> bool {
    STATUS_KEY.is_match(key)
}

pub fn is_tags_key(key: &str, _value: &PropertyValue) -> bool {
    TAGS_KEY.is_match(key)
}

pub fn is_contact_key(key: &str, _value: &PropertyValue) -> bool {
    names_contact(key)
}

pub fn is_comment_key(key: &str, _value: &PropertyValue) -> bool {
    names_comment(key)
}

pub fn is_date_key(key: &str, _value: &PropertyValue) -> bool {
    names_date(key)
}

/// Select, rich-text or rollup property whose name refers to a record
pub fn is_related_name(key: &str, value: &PropertyValue) -> bool {
    matches!(
        value,
        PropertyValue::Select { .. } | PropertyValue::RichText { .. } | PropertyValue::Rollup { .. }
    ) && RELATED_NAME_KEY.is_match(key)
}

// Name-only checks, for database schemas where no value is available

pub fn names_contact(key: &str) -> bool {
    CONTACT_KEY.is_match(key)
}

pub fn names_comment(key: &str) -> bool {
    COMMENT_KEY.is_match(key)
}

pub fn names_date(key: &str) -> bool {
    DATE_KEY.is_match(key)
}

/// Relation-typed property whose name says it points at a record
pub fn is_named_relation(key: &str, value: &PropertyValue) -> bool {
    value.is_relation() && RELATION_KEY.is_match(key)
}

/// Any relation-typed property with at least one link
pub fn is_linked_relation(_key: &str, value: &PropertyValue) -> bool {
    !value.relation_ids().is_empty()
}

// ========================================
// Extractors
// ========================================

/// Title or rich-text first segment
pub fn text(value: &PropertyValue) -> Option<String> {
    value.first_text().map(str::to_string)
}

/// Select/status name, falling back to the first text segment
pub fn select_or_text(value: &PropertyValue) -> Option<String> {
    value
        .select_name()
        .or_else(|| value.first_text())
        .map(str::to_string)
}

/// First text segment, falling back to the select/status name
pub fn text_or_select(value: &PropertyValue) -> Option<String> {
    value
        .first_text()
        .or_else(|| value.select_name())
        .map(str::to_string)
}

pub fn phone(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::PhoneNumber { phone_number } => {
            phone_number.clone().filter(|p| !p.is_empty())
        }
        other => text(other),
    }
}

pub fn url(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Url { url } => url.clone().filter(|u| !u.is_empty()),
        other => text(other),
    }
}

pub fn email(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Email { email } => email.clone().filter(|e| !e.is_empty()),
        other => text(other),
    }
}

/// Multi-select names or comma-separated text, joined with commas
pub fn tag_list(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::MultiSelect { multi_select } if !multi_select.is_empty() => Some(
            multi_select
                .iter()
                .map(|o| o.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => select_or_text(other),
    }
}

pub fn date_start(value: &PropertyValue) -> Option<String> {
    value.date_start().map(str::to_string)
}

/// First linked page id
pub fn first_link(value: &PropertyValue) -> Option<String> {
    value.relation_ids().first().map(|r| r.id.clone())
}

/// Human-readable name of a related record, for display only
pub fn related_name(value: &PropertyValue) -> Option<String> {
    match value {
        PropertyValue::Select { .. } => value.select_name().map(str::to_string),
        PropertyValue::RichText { .. } => text(value),
        PropertyValue::Rollup {
            rollup: Rollup::Array { array },
        } => array.first().and_then(|first| match first {
            PropertyValue::Title { .. } | PropertyValue::RichText { .. } => text(first),
            PropertyValue::Select { .. } => first.select_name().map(str::to_string),
            _ => None,
        }),
        _ => None,
    }
}

// ========================================
// Field rule tables
// ========================================

pub const NAME: &[Rule] = &[Rule { label: "name", matches: is_title, extract: text }];

pub const ADDRESS: &[Rule] = &[Rule { label: "address", matches: is_address_key, extract: text }];

pub const PHONE: &[Rule] = &[Rule { label: "phone", matches: is_phone_key, extract: phone }];

pub const WEBSITE: &[Rule] = &[Rule { label: "website", matches: is_website_key, extract: url }];

pub const EMAIL: &[Rule] = &[Rule { label: "email", matches: is_email_key, extract: email }];

pub const CLASS: &[Rule] = &[Rule { label: "class", matches: is_class_key, extract: select_or_text }];

pub const AGENT: &[Rule] = &[Rule { label: "agent", matches: is_agent_key, extract: select_or_text }];

pub const STATUS: &[Rule] = &[Rule { label: "status", matches: is_status_key, extract: select_or_text }];

pub const TAGS: &[Rule] = &[Rule { label: "tags", matches: is_tags_key, extract: tag_list }];

pub const HISTORY_AGENT: &[Rule] = &[Rule { label: "history.agent", matches: is_title, extract: text }];

pub const HISTORY_TITLE: &[Rule] = &[Rule {
    label: "history.title",
    matches: is_contact_key,
    extract: text_or_select,
}];

pub const HISTORY_COMMENT: &[Rule] = &[Rule {
    label: "history.comment",
    matches: is_comment_key,
    extract: text,
}];

pub const HISTORY_DATE: &[Rule] = &[Rule { label: "history.date", matches: is_date_key, extract: date_start }];

/// Relation identifier: a name-matching relation first, then any linked
/// relation.
pub const RELATION_ID: &[Rule] = &[
    Rule {
        label: "relation.named",
        matches: is_named_relation,
        extract: first_link,
    },
    Rule {
        label: "relation.any",
        matches: is_linked_relation,
        extract: first_link,
    },
];

/// Display-name fallback, consulted only when no identifier resolved
pub const RELATION_NAME: &[Rule] = &[Rule {
    label: "relation.name",
    matches: is_related_name,
    extract: related_name,
}];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::property::{PageRef, RichText, SelectOption};

    fn rich(text: &str) -> PropertyValue {
        PropertyValue::RichText {
            rich_text: vec![RichText {
                plain_text: text.to_string(),
            }],
        }
    }

    fn props(entries: Vec<(&str, PropertyValue)>) -> BTreeMap<String, PropertyValue> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let other = PropertyValue::Other;
        assert!(is_address_key("DIRECCIÓN", &other));
        assert!(is_address_key("Ubicación", &other));
        assert!(is_phone_key("Teléfono", &other));
        assert!(is_class_key("CLASE", &other));
        assert!(is_agent_key("Agente", &other));
        assert!(!is_agent_key("Nombre", &other));
    }

    #[test]
    fn test_apply_first_sorted_key_wins() {
        let properties = props(vec![
            ("Tel oficina", rich("222")),
            ("Phone", rich("111")),
        ]);
        // "Phone" sorts before "Tel oficina"
        assert_eq!(apply(&properties, PHONE), Some("111".to_string()));
    }

    #[test]
    fn test_apply_falls_through_to_next_rule() {
        let properties = props(vec![
            ("Cliente", PropertyValue::Relation { relation: vec![] }),
            (
                "Proyecto",
                PropertyValue::Relation {
                    relation: vec![PageRef { id: "p-9".to_string() }],
                },
            ),
        ]);
        assert_eq!(apply(&properties, RELATION_ID), Some("p-9".to_string()));
    }

    #[test]
    fn test_mistyped_class_uses_text() {
        let properties = props(vec![("Clase", rich("B"))]);
        assert_eq!(apply(&properties, CLASS), Some("B".to_string()));
    }

    #[test]
    fn test_tag_list_joins_multi_select() {
        let value = PropertyValue::MultiSelect {
            multi_select: vec![
                SelectOption { name: "vip".to_string() },
                SelectOption { name: "norte".to_string() },
            ],
        };
        assert_eq!(tag_list(&value), Some("vip,norte".to_string()));
    }

    #[test]
    fn test_display_name_skips_empty_relation_column() {
        let properties = props(vec![
            ("Cliente", PropertyValue::Relation { relation: vec![] }),
            (
                "Empresa",
                PropertyValue::Select {
                    select: Some(SelectOption { name: "Acme".to_string() }),
                },
            ),
        ]);
        assert_eq!(apply(&properties, RELATION_ID), None);
        assert_eq!(apply(&properties, RELATION_NAME), Some("Acme".to_string()));
    }

    #[test]
    fn test_related_name_ignores_unsupported_types() {
        assert_eq!(related_name(&PropertyValue::Url { url: Some("x".into()) }), None);
        assert_eq!(related_name(&rich("Acme")), Some("Acme".to_string()));
    }
}
