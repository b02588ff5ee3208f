//! # Leadbook Client
//!
//! Typed access to the leadbook-api endpoints and the in-memory store
//! that front ends keep between refreshes: loaded records, tab and
//! selection state, and optimistically saved notes.

pub mod api;
pub mod error;
pub mod store;

pub use api::{ApiClient, CrmApi};
pub use error::{ClientError, Result};
pub use store::{AppStore, HistoryEntry, SyncState, Tab};
