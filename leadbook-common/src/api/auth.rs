//! Sign-in allow-list
//!
//! The service verifies a Google ID token and then checks the verified
//! email against a static allow-list file (a JSON array of addresses).
//!
//! # Empty list bypass
//!
//! An empty allow-list admits every verified identity. This is deliberate:
//! a fresh deployment without `allowed_users.json` must still be usable,
//! and the token itself is still verified.
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies here; the token verification call lives
//! in `leadbook-api`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Identity extracted from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GoogleIdentity {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Set of email addresses allowed to sign in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    emails: Vec<String>,
}

impl AllowList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.into().trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Parse the JSON array form of the allow-list file
    pub fn from_json(raw: &str) -> Result<Self> {
        let emails: Vec<String> = serde_json::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid allow-list JSON: {}", e)))?;
        Ok(Self::new(emails))
    }

    /// Load the allow-list file.
    ///
    /// A missing or unreadable file yields an empty list (and therefore the
    /// bypass behaviour) with a warning; it never aborts startup.
    pub fn load_or_empty(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    "Could not read allow-list {}: {} (every verified user will be admitted)",
                    path.display(),
                    e
                );
                return Self::default();
            }
        };

        match Self::from_json(&raw) {
            Ok(list) => {
                info!("Loaded {} allowed users from {}", list.len(), path.display());
                list
            }
            Err(e) => {
                warn!("{} (every verified user will be admitted)", e);
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Whether `email` may sign in. Comparison ignores case.
    pub fn permits(&self, email: &str) -> bool {
        if self.emails.is_empty() {
            return true;
        }
        let email = email.trim().to_lowercase();
        self.emails.iter().any(|allowed| *allowed == email)
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_list_permits_everyone() {
        let list = AllowList::default();
        assert!(list.permits("anyone@example.com"));
        assert!(list.permits(""));
    }

    #[test]
    fn test_list_matches_case_insensitively() {
        let list = AllowList::new(["Ana@Example.com"]);
        assert!(list.permits("ana@example.com"));
        assert!(list.permits(" ANA@EXAMPLE.COM "));
        assert!(!list.permits("bob@example.com"));
    }

    #[test]
    fn test_from_json_rejects_non_array() {
        assert!(AllowList::from_json(r#"{"email": "a@b.c"}"#).is_err());
        let list = AllowList::from_json(r#"["a@b.c", "", "d@e.f"]"#).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let list = AllowList::load_or_empty(&dir.path().join("allowed_users.json"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["ventas@acme.mx"]"#).unwrap();

        let list = AllowList::load_or_empty(file.path());
        assert_eq!(list.len(), 1);
        assert!(list.permits("ventas@acme.mx"));
        assert!(!list.permits("otro@acme.mx"));
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(AllowList::load_or_empty(file.path()).is_empty());
    }
}
