//! Mass-message audience selection

use crate::models::Record;
use crate::{Error, Result};

/// Every tag used by `clients`, trimmed and de-duplicated, in the order
/// first seen.
pub fn available_tags(clients: &[Record]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in clients.iter().flat_map(|c| c.tags.iter()) {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Clients carrying any of `selected` tags; every client when none are
/// selected.
pub fn select_audience<'a>(clients: &'a [Record], selected: &[String]) -> Vec<&'a Record> {
    if selected.is_empty() {
        return clients.iter().collect();
    }
    clients
        .iter()
        .filter(|client| {
            client
                .tags
                .iter()
                .any(|tag| selected.iter().any(|s| s.trim() == tag.trim()))
        })
        .collect()
}

/// A message ready to go out, with its resolved recipients
#[derive(Debug, Clone, PartialEq)]
pub struct Campaign<'a> {
    pub message: String,
    pub recipients: Vec<&'a Record>,
}

impl<'a> Campaign<'a> {
    /// Validate a campaign before sending.
    ///
    /// Rejects a blank message, and a tag filter that matches nobody.
    pub fn prepare(clients: &'a [Record], selected: &[String], message: &str) -> Result<Self> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::InvalidInput("Message is empty".to_string()));
        }

        let recipients = select_audience(clients, selected);
        if recipients.is_empty() {
            return Err(Error::InvalidInput(
                "No recipients match the selected tags".to_string(),
            ));
        }

        tracing::debug!(recipients = recipients.len(), tags = ?selected, "Campaign prepared");
        Ok(Self {
            message: message.to_string(),
            recipients,
        })
    }
}
