//! API module for shared HTTP API functionality
//!
//! Request/response types and the sign-in allow-list used by both the
//! service (`leadbook-api`) and its clients (`leadbook-client`).
//!
//! # Design Principle
//!
//! This module contains ONLY pure functions and shared types. The axum
//! wiring and the identity-provider call live in the service crate.

pub mod auth;
pub mod types;

pub use auth::{AllowList, GoogleIdentity};
pub use types::{
    AuthUser, DateRange, ErrorResponse, GenerateLeadsRequest, GoogleAuthRequest,
    GoogleAuthResponse, MessageResponse, NewHistory, NewRecord, NewSupportTicket, RecordUpdate,
};
