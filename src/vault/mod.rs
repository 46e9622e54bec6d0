//! Credential vault
//!
//! Encrypts long-lived third-party access tokens with the vault key from
//! the secrets bundle before they reach the application database, and
//! decrypts them on demand. The vault owns only the transform: record
//! lifecycle and referential integrity belong to the credential store
//! collaborator.
//!
//! Calls are independent and stateless given a vault key, so concurrent
//! web requests need no locking here; atomic read-modify-write of a
//! single record is the collaborator's responsibility.

use crate::crypto::{self, VaultKey};
use crate::error::{TallyError, TallyResult};
use crate::models::CredentialRecord;
use crate::storage::CredentialStore;

/// Per-record symmetric encryption over a credential store
pub struct CredentialVault<S: CredentialStore> {
    records: S,
}

impl<S: CredentialStore> CredentialVault<S> {
    /// Create a vault over a credential store
    pub fn new(records: S) -> Self {
        Self { records }
    }

    /// Access the underlying store
    pub fn records(&self) -> &S {
        &self.records
    }

    /// Encrypt a token and persist it for a (user, institution) pair
    ///
    /// One credential per pair: storing again for the same pair replaces
    /// the previous payload and touches the last-used timestamp.
    pub fn store(
        &self,
        vault_key: &VaultKey,
        user_id: &str,
        institution: &str,
        token: &str,
    ) -> TallyResult<CredentialRecord> {
        let payload = crypto::encrypt(vault_key, token.as_bytes())?;

        match self.records.find_by(user_id, institution)? {
            Some(mut existing) => {
                existing.replace_payload(payload);
                self.records.update(existing.clone())?;
                Ok(existing)
            }
            None => {
                let record = CredentialRecord::new(user_id, institution, payload);
                self.records.insert(record.clone())?;
                Ok(record)
            }
        }
    }

    /// Decrypt the stored token for a (user, institution) pair
    ///
    /// Touches the record's last-used timestamp on success. A payload
    /// that fails authentication surfaces as an authentication error
    /// (usually a vault-key mismatch after an incomplete rotation) and
    /// is never masked as not-found.
    pub fn retrieve(
        &self,
        vault_key: &VaultKey,
        user_id: &str,
        institution: &str,
    ) -> TallyResult<String> {
        let mut record = self
            .records
            .find_by(user_id, institution)?
            .ok_or_else(|| {
                TallyError::credential_not_found(format!("{}/{}", user_id, institution))
            })?;

        let plaintext = crypto::decrypt(vault_key, &record.payload).map_err(|_| {
            TallyError::Authentication(format!(
                "stored credential for {}/{} is unreadable; the vault key may not match",
                user_id, institution
            ))
        })?;

        let token = String::from_utf8(plaintext).map_err(|_| {
            TallyError::Authentication(format!(
                "stored credential for {}/{} decrypted to invalid UTF-8",
                user_id, institution
            ))
        })?;

        record.touch();
        self.records.update(record)?;

        Ok(token)
    }

    /// Remove the credential for a (user, institution) pair
    pub fn unlink(&self, user_id: &str, institution: &str) -> TallyResult<bool> {
        self.records.delete(user_id, institution)
    }

    /// Re-encrypt every stored credential under a new vault key
    ///
    /// Required whenever the database encryption key in the secrets
    /// bundle is rotated; without it, previously stored credentials are
    /// orphaned under the old key. Returns the number of records
    /// re-encrypted.
    pub fn rotate_vault_key(&self, old_key: &VaultKey, new_key: &VaultKey) -> TallyResult<usize> {
        let records = self.records.all()?;
        let mut rotated = 0;

        for mut record in records {
            let plaintext = crypto::decrypt(old_key, &record.payload).map_err(|_| {
                TallyError::Authentication(format!(
                    "credential for {}/{} could not be decrypted with the old vault key",
                    record.user_id, record.institution
                ))
            })?;

            record.replace_payload(crypto::encrypt(new_key, &plaintext)?);
            self.records.update(record)?;
            rotated += 1;
        }

        Ok(rotated)
    }
}
