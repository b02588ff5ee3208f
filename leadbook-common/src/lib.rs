//! # Leadbook Common Library
//!
//! Shared code for the Leadbook API service and its clients:
//! - Canonical data model (records, history, tickets, quotes)
//! - Workspace page normalization (schema-less property inference)
//! - API request/response types and the sign-in allow-list
//! - Configuration loading
//! - Mass-message audience selection

pub mod api;
pub mod audience;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod quote;

pub use error::{Error, Result};
pub use models::{ClassTag, HistoryItem, HistoryKind, Record, RecordKind, SupportTicket};
