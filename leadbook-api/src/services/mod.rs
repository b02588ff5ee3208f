//! Outbound service clients

pub mod gemini_client;
pub mod google_verifier;
pub mod notion_client;

pub use gemini_client::{GeminiClient, GeminiError, TextModel};
pub use google_verifier::{GoogleTokenVerifier, TokenVerifier, VerifyError};
pub use notion_client::{DatabaseQuery, NotionClient, NotionError};
