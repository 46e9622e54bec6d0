//! Credential record model
//!
//! Represents a linked third-party credential (e.g., a bank-data access
//! token) with its payload stored only in encrypted form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Strongly-typed credential identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialId(Uuid);

impl CredentialId {
    /// Create a new random ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cred-{}", &self.0.to_string()[..8])
    }
}

/// A persisted, owner-scoped third-party credential
///
/// The payload holds the access token in encrypted form only (base64,
/// nonce prefix then ciphertext and tag); the plaintext token never
/// appears in storage or logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Unique identifier
    pub id: CredentialId,

    /// Owning user reference
    pub user_id: String,

    /// Institution/provider tag (e.g., "first-national")
    pub institution: String,

    /// Encrypted access token
    pub payload: String,

    /// When the credential was first linked
    pub created_at: DateTime<Utc>,

    /// When the credential was last used or refreshed
    pub last_used_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Create a new record around an already-encrypted payload
    pub fn new(
        user_id: impl Into<String>,
        institution: impl Into<String>,
        payload: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CredentialId::new(),
            user_id: user_id.into(),
            institution: institution.into(),
            payload,
            created_at: now,
            last_used_at: now,
        }
    }

    /// Replace the encrypted payload and touch the last-used timestamp
    pub fn replace_payload(&mut self, payload: String) {
        self.payload = payload;
        self.touch();
    }

    /// Update the last-used timestamp
    pub fn touch(&mut self) {
        self.last_used_at = Utc::now();
    }
}
