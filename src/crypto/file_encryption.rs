//! Multi-recipient file encryption
//!
//! An encrypted file is a JSON document safe to commit to version control:
//! the payload is AES-256-GCM encrypted under a random file key, and the
//! file key is wrapped once per recipient public key. Any one matching
//! private identity can decrypt.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crypto::aead::{self, VaultKey};
use crate::crypto::keypair::{unwrap_file_key, wrap_file_key, Identity, Recipient};
use crate::error::{TallyError, TallyResult};

/// Current encrypted-file format version
const FORMAT_VERSION: u8 = 1;

/// One recipient's wrapped copy of the file key
///
/// The public key is stored in the clear so decryption can select the
/// matching stanza, and so operators can see who a file is encrypted to.
/// Public keys are not secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientStanza {
    /// Recipient public key (hex encoded)
    pub public_key: String,
    /// File key wrapped to this recipient (base64 encoded)
    pub wrapped_key: String,
}

/// The at-rest representation of an encrypted file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedFile {
    /// Version for future format upgrades
    #[serde(default = "default_version")]
    pub version: u8,
    /// One stanza per recipient the file is encrypted to
    pub recipients: Vec<RecipientStanza>,
    /// Encrypted payload (base64, nonce prefix then ciphertext+tag)
    pub payload: String,
}

fn default_version() -> u8 {
    FORMAT_VERSION
}

impl EncryptedFile {
    /// Encrypt a plaintext blob to one or more recipients
    pub fn encrypt(plaintext: &[u8], recipients: &[Recipient]) -> TallyResult<Self> {
        if recipients.is_empty() {
            return Err(TallyError::Encryption(
                "at least one recipient is required".to_string(),
            ));
        }

        let file_key = VaultKey::generate();
        let payload = aead::encrypt(&file_key, plaintext)?;

        let mut stanzas = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            stanzas.push(RecipientStanza {
                public_key: recipient.to_hex(),
                wrapped_key: wrap_file_key(&file_key, recipient)?,
            });
        }

        Ok(Self {
            version: FORMAT_VERSION,
            recipients: stanzas,
            payload,
        })
    }

    /// Decrypt with a private identity
    ///
    /// `source` labels the file in error messages. Failure distinguishes
    /// "not encrypted to any identity you hold" from "matched but
    /// corrupted", and always reports the identity's own public key so an
    /// operator can diagnose recipient mismatches.
    pub fn decrypt(&self, identity: &Identity, source: &str) -> TallyResult<Vec<u8>> {
        if self.version != FORMAT_VERSION {
            return Err(TallyError::Encryption(format!(
                "Unsupported encrypted-file version: {}",
                self.version
            )));
        }

        let own_key = identity.recipient().to_hex();

        let stanza = self
            .recipients
            .iter()
            .find(|s| s.public_key == own_key)
            .ok_or_else(|| TallyError::Decryption {
                path: source.to_string(),
                reason: "file is not encrypted to any identity you hold".to_string(),
                public_key: own_key.clone(),
            })?;

        let file_key =
            unwrap_file_key(&stanza.wrapped_key, identity).map_err(|_| TallyError::Decryption {
                path: source.to_string(),
                reason: "matching recipient entry found but the file is corrupted".to_string(),
                public_key: own_key.clone(),
            })?;

        aead::decrypt(&file_key, &self.payload).map_err(|_| TallyError::Decryption {
            path: source.to_string(),
            reason: "payload failed authentication; the file is corrupted".to_string(),
            public_key: own_key,
        })
    }

    /// Read an encrypted file from disk
    pub fn read(path: &Path) -> TallyResult<Self> {
        if !path.exists() {
            return Err(TallyError::Config(format!(
                "Encrypted file not found: {}",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| TallyError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&contents)
            .map_err(|e| TallyError::Json(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Write the encrypted file to disk atomically (write to temp, then
    /// rename), so no partial file is ever left behind
    pub fn write(&self, path: &Path) -> TallyResult<()> {
        crate::storage::file_io::write_json_atomic(path, self)
    }
}

/// Encrypt a plaintext file to the given recipients
pub fn encrypt_file(
    plaintext_path: &Path,
    recipients: &[Recipient],
    output_path: &Path,
) -> TallyResult<()> {
    if !plaintext_path.exists() {
        return Err(TallyError::Config(format!(
            "File not found: {}",
            plaintext_path.display()
        )));
    }
    let plaintext = fs::read(plaintext_path).map_err(|e| {
        TallyError::Io(format!("Failed to read {}: {}", plaintext_path.display(), e))
    })?;

    let encrypted = EncryptedFile::encrypt(&plaintext, recipients)?;
    encrypted.write(output_path)
}

/// Decrypt an encrypted file with a private identity
pub fn decrypt_file(ciphertext_path: &Path, identity: &Identity) -> TallyResult<Vec<u8>> {
    let encrypted = EncryptedFile::read(ciphertext_path)?;
    encrypted.decrypt(identity, &ciphertext_path.display().to_string())
}
