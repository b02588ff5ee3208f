//! Client-side application store
//!
//! One owned struct holds everything the UI renders. Each field has a
//! single writer method; views read through accessors. Notes are inserted
//! optimistically with [`SyncState::Pending`] and later confirmed or
//! marked failed, and failed notes can be retried or discarded.

use leadbook_common::api::{DateRange, NewHistory, RecordUpdate};
use leadbook_common::audience::{self, Campaign};
use leadbook_common::normalize::defaults;
use leadbook_common::{ClassTag, HistoryItem, HistoryKind, Record, RecordKind, SupportTicket};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::api::CrmApi;
use crate::error::{ClientError, Result};

/// Prefix of ids given to notes the server has not confirmed yet
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Top-level views
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    /// Leads pipeline
    #[default]
    Sales,
    Quotes,
    Clients,
    MassMessaging,
}

/// Server confirmation state of a history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Pending,
    Confirmed,
    Failed { error: String },
}

/// What a note was saved against, kept so a failed save can be retried
#[derive(Debug, Clone, PartialEq)]
struct NoteDraft {
    text: String,
    agent: String,
    interaction_type: String,
    related_id: String,
    related_kind: RecordKind,
}

impl NoteDraft {
    fn request(&self) -> NewHistory {
        let (lead_id, client_id) = match self.related_kind {
            RecordKind::Client => (None, Some(self.related_id.clone())),
            RecordKind::Lead => (Some(self.related_id.clone()), None),
        };
        NewHistory {
            text: self.text.clone(),
            agent: self.agent.clone(),
            interaction_type: self.interaction_type.clone(),
            title: None,
            lead_id,
            client_id,
        }
    }
}

/// A history item as displayed
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub item: HistoryItem,
    /// Website of the related record, when it is loaded
    pub client_website: Option<String>,
    pub sync: SyncState,
    draft: Option<NoteDraft>,
}

impl HistoryEntry {
    fn confirmed(item: HistoryItem) -> Self {
        Self {
            item,
            client_website: None,
            sync: SyncState::Confirmed,
            draft: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.item.id
    }

    pub fn related_id(&self) -> Option<&str> {
        self.item.client_id.as_deref()
    }

    pub fn related_kind(&self) -> Option<RecordKind> {
        self.item.related_kind
    }

    /// Name shown next to the entry
    pub fn related_name(&self) -> &str {
        self.item.client_name.as_deref().unwrap_or(defaults::UNASSIGNED_AGENT)
    }
}

/// Type of an optimistic note: mail-like interactions are emails
pub fn note_kind(interaction_type: &str) -> HistoryKind {
    let lower = interaction_type.to_lowercase();
    if lower.contains("mail") || lower.contains("correo") {
        HistoryKind::Email
    } else {
        HistoryKind::Note
    }
}

#[derive(Debug, Default)]
pub struct AppStore {
    leads: Vec<Record>,
    clients: Vec<Record>,
    support_tickets: Vec<SupportTicket>,
    /// Every known entry, newest first
    history: Vec<HistoryEntry>,
    tab: Tab,
    selected_lead: Option<String>,
    selected_client: Option<String>,
    /// Clients tab shows global history because no entry relates to a client
    clients_fallback: bool,
    next_temp: u64,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================
    // Accessors
    // ========================================

    pub fn leads(&self) -> &[Record] {
        &self.leads
    }

    pub fn clients(&self) -> &[Record] {
        &self.clients
    }

    pub fn support_tickets(&self) -> &[SupportTicket] {
        &self.support_tickets
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn selected_lead(&self) -> Option<&Record> {
        let id = self.selected_lead.as_deref()?;
        self.leads.iter().find(|r| r.id == id)
    }

    pub fn selected_client(&self) -> Option<&Record> {
        let id = self.selected_client.as_deref()?;
        self.clients.iter().find(|r| r.id == id)
    }

    pub fn entry(&self, id: &str) -> Option<&HistoryEntry> {
        self.history.iter().find(|e| e.id() == id)
    }

    /// Record `id` in the collection `kind`, or in either one when untyped
    fn find_record(&self, kind: Option<RecordKind>, id: &str) -> Option<&Record> {
        let leads = self.leads.iter().filter(|_| kind != Some(RecordKind::Client));
        let clients = self.clients.iter().filter(|_| kind != Some(RecordKind::Lead));
        leads.chain(clients).find(|r| r.id == id)
    }

    // ========================================
    // Loading
    // ========================================

    /// Fetch everything from the service and replace the loaded data
    pub async fn load(&mut self, api: &dyn CrmApi) -> Result<()> {
        let leads = api.list_leads().await?;
        let clients = api.list_clients().await?;
        let tickets = api.list_support_tickets().await?;

        let range = DateRange::default();
        let mut history = api.list_history(&range).await?;
        history.extend(api.list_client_history(&range).await?);

        info!(
            leads = leads.len(),
            clients = clients.len(),
            history = history.len(),
            "Loaded workspace data"
        );
        self.replace_data(leads, clients, tickets, history);
        Ok(())
    }

    /// Replace loaded data.
    ///
    /// History is deduplicated by id and sorted newest first. Unconfirmed
    /// notes survive the refresh unless the server already returned them.
    pub fn replace_data(
        &mut self,
        leads: Vec<Record>,
        clients: Vec<Record>,
        support_tickets: Vec<SupportTicket>,
        history: Vec<HistoryItem>,
    ) {
        self.leads = leads;
        self.clients = clients;
        self.support_tickets = support_tickets;

        let mut seen = HashSet::new();
        let mut entries: Vec<HistoryEntry> = history
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .map(|item| self.enrich(HistoryEntry::confirmed(item)))
            .collect();
        entries.sort_by(|a, b| b.item.timestamp.cmp(&a.item.timestamp));

        let unconfirmed: Vec<HistoryEntry> = self
            .history
            .drain(..)
            .filter(|e| e.sync != SyncState::Confirmed && !seen.contains(&e.item.id))
            .collect();
        entries.splice(0..0, unconfirmed);
        self.history = entries;

        // Drop selections whose record disappeared
        self.selected_lead = self
            .selected_lead
            .take()
            .filter(|id| self.leads.iter().any(|r| &r.id == id));
        self.selected_client = self
            .selected_client
            .take()
            .filter(|id| self.clients.iter().any(|r| &r.id == id));
        if self.tab == Tab::Clients {
            self.clients_fallback = self.client_history_is_empty();
        }
    }

    /// Attach the related record's name and website
    fn enrich(&self, mut entry: HistoryEntry) -> HistoryEntry {
        let related = entry
            .related_id()
            .and_then(|id| self.find_record(entry.related_kind(), id));
        match related {
            Some(record) => {
                entry.item.client_name = Some(record.name.clone());
                entry.client_website = Some(record.website.clone()).filter(|w| !w.is_empty());
            }
            None => {
                if entry.item.client_name.as_deref().map_or(true, |n| n.trim().is_empty()) {
                    entry.item.client_name = Some(defaults::UNASSIGNED_AGENT.to_string());
                }
            }
        }
        entry
    }

    // ========================================
    // Navigation
    // ========================================

    /// Switch view; selections are cleared
    pub fn switch_tab(&mut self, tab: Tab) {
        debug!(?tab, "Switching tab");
        self.tab = tab;
        self.selected_lead = None;
        self.selected_client = None;
        self.clients_fallback = tab == Tab::Clients && self.client_history_is_empty();
    }

    pub fn select_lead(&mut self, id: &str) -> Result<()> {
        if !self.leads.iter().any(|r| r.id == id) {
            return Err(ClientError::InvalidInput(format!("Unknown lead {}", id)));
        }
        self.selected_lead = Some(id.to_string());
        Ok(())
    }

    pub fn select_client(&mut self, id: &str) -> Result<()> {
        if !self.clients.iter().any(|r| r.id == id) {
            return Err(ClientError::InvalidInput(format!("Unknown client {}", id)));
        }
        self.selected_client = Some(id.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected_lead = None;
        self.selected_client = None;
    }

    fn client_ids(&self) -> HashSet<&str> {
        self.clients.iter().map(|r| r.id.as_str()).collect()
    }

    fn relates_to_known_client(&self, entry: &HistoryEntry, ids: &HashSet<&str>) -> bool {
        entry
            .related_id()
            .is_some_and(|id| ids.contains(id) && entry.item.relates_to(RecordKind::Client, id))
    }

    fn client_history_is_empty(&self) -> bool {
        let ids = self.client_ids();
        !self.history.iter().any(|e| self.relates_to_known_client(e, &ids))
    }

    /// History for the current tab and selection
    pub fn visible_history(&self) -> Vec<&HistoryEntry> {
        let related_to = |kind: RecordKind, id: &str| -> Vec<&HistoryEntry> {
            self.history
                .iter()
                .filter(|e| e.item.relates_to(kind, id))
                .collect()
        };

        match self.tab {
            Tab::Sales => match self.selected_lead.as_deref() {
                Some(id) => related_to(RecordKind::Lead, id),
                None => self.history.iter().collect(),
            },
            Tab::Clients => match self.selected_client.as_deref() {
                Some(id) => related_to(RecordKind::Client, id),
                None if self.clients_fallback => self.history.iter().collect(),
                None => {
                    let ids = self.client_ids();
                    self.history
                        .iter()
                        .filter(|e| self.relates_to_known_client(e, &ids))
                        .collect()
                }
            },
            Tab::Quotes | Tab::MassMessaging => self.history.iter().collect(),
        }
    }

    // ========================================
    // Optimistic notes
    // ========================================

    /// Insert a pending note against the current selection.
    ///
    /// The Clients tab saves against the selected client; every other tab
    /// against the selected lead. Returns the temporary id.
    pub fn begin_note(&mut self, text: &str, agent: &str, interaction_type: &str) -> Result<String> {
        let temp_id = format!("{}{}", TEMP_ID_PREFIX, self.next_temp + 1);
        let (record, related_kind) = if self.tab == Tab::Clients {
            (self.selected_client(), RecordKind::Client)
        } else {
            (self.selected_lead(), RecordKind::Lead)
        };
        let record = record.ok_or(ClientError::NoSelection)?;

        let entry = HistoryEntry {
            item: HistoryItem {
                id: temp_id.clone(),
                kind: note_kind(interaction_type),
                title: interaction_type.to_string(),
                comment: text.to_string(),
                agent: agent.to_string(),
                timestamp: String::new(),
                client_id: Some(record.id.clone()),
                related_kind: Some(related_kind),
                client_name: Some(record.name.clone()),
            },
            client_website: Some(record.website.clone()).filter(|w| !w.is_empty()),
            sync: SyncState::Pending,
            draft: Some(NoteDraft {
                text: text.to_string(),
                agent: agent.to_string(),
                interaction_type: interaction_type.to_string(),
                related_id: record.id.clone(),
                related_kind,
            }),
        };

        self.next_temp += 1;
        self.history.insert(0, entry);
        Ok(temp_id)
    }

    fn entry_mut(&mut self, temp_id: &str) -> Result<&mut HistoryEntry> {
        self.history
            .iter_mut()
            .find(|e| e.id() == temp_id)
            .ok_or_else(|| ClientError::UnknownNote(temp_id.to_string()))
    }

    /// Replace a pending note with the server's record
    pub fn confirm_note(&mut self, temp_id: &str, saved: HistoryItem) -> Result<()> {
        let position = self
            .history
            .iter()
            .position(|e| e.id() == temp_id)
            .ok_or_else(|| ClientError::UnknownNote(temp_id.to_string()))?;

        let pending = self.history.remove(position);
        // A refresh may already have delivered the saved row
        self.history.retain(|e| e.id() != saved.id);

        let mut entry = self.enrich(HistoryEntry::confirmed(saved));
        if entry.item.client_id.is_none() {
            entry.item.client_id = pending.item.client_id;
            entry.item.related_kind = pending.item.related_kind;
            entry.item.client_name = pending.item.client_name;
            entry.client_website = pending.client_website;
        }
        self.history.insert(position.min(self.history.len()), entry);
        Ok(())
    }

    pub fn fail_note(&mut self, temp_id: &str, error: &str) -> Result<()> {
        let entry = self.entry_mut(temp_id)?;
        entry.sync = SyncState::Failed {
            error: error.to_string(),
        };
        Ok(())
    }

    /// Remove a failed note
    pub fn discard_note(&mut self, temp_id: &str) -> Result<()> {
        let entry = self.entry_mut(temp_id)?;
        if !matches!(entry.sync, SyncState::Failed { .. }) {
            return Err(ClientError::InvalidInput(format!("Note {} has not failed", temp_id)));
        }
        self.history.retain(|e| e.id() != temp_id);
        Ok(())
    }

    async fn submit(&mut self, api: &dyn CrmApi, temp_id: &str) -> Result<HistoryItem> {
        let draft = self
            .entry_mut(temp_id)?
            .draft
            .clone()
            .ok_or_else(|| ClientError::UnknownNote(temp_id.to_string()))?;

        let request = draft.request();
        let result = match draft.related_kind {
            RecordKind::Client => api.add_client_history(&request).await,
            RecordKind::Lead => api.add_history(&request).await,
        };

        match result {
            Ok(saved) => {
                self.confirm_note(temp_id, saved.clone())?;
                info!(id = %saved.id, "Note saved");
                Ok(saved)
            }
            Err(e) => {
                warn!("Failed to save note {}: {}", temp_id, e);
                self.fail_note(temp_id, &e.to_string())?;
                Err(e)
            }
        }
    }

    /// Optimistically insert a note and send it to the service
    pub async fn save_note(
        &mut self,
        api: &dyn CrmApi,
        text: &str,
        agent: &str,
        interaction_type: &str,
    ) -> Result<HistoryItem> {
        let temp_id = self.begin_note(text, agent, interaction_type)?;
        self.submit(api, &temp_id).await
    }

    /// Send a failed note again
    pub async fn retry_note(&mut self, api: &dyn CrmApi, temp_id: &str) -> Result<HistoryItem> {
        let entry = self.entry_mut(temp_id)?;
        if !matches!(entry.sync, SyncState::Failed { .. }) {
            return Err(ClientError::InvalidInput(format!("Note {} has not failed", temp_id)));
        }
        entry.sync = SyncState::Pending;
        self.submit(api, temp_id).await
    }

    // ========================================
    // Lead class and mass messaging
    // ========================================

    /// Change a lead's class on the server and store the returned record
    pub async fn change_lead_class(
        &mut self,
        api: &dyn CrmApi,
        id: &str,
        class: ClassTag,
    ) -> Result<()> {
        let update = RecordUpdate {
            class: Some(class),
            ..Default::default()
        };
        let updated = api.update_lead(id, &update).await?;
        if let Some(lead) = self.leads.iter_mut().find(|r| r.id == id) {
            *lead = updated;
        }
        Ok(())
    }

    /// Tags offered by the mass-messaging view
    pub fn available_tags(&self) -> Vec<String> {
        audience::available_tags(&self.clients)
    }

    /// Validate and assemble a mass message for the loaded clients
    pub fn prepare_campaign(&self, selected_tags: &[String], message: &str) -> Result<Campaign<'_>> {
        Ok(Campaign::prepare(&self.clients, selected_tags, message)?)
    }
}
