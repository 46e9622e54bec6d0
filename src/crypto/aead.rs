//! AES-256-GCM encryption/decryption
//!
//! Provides the authenticated-encryption primitive used by every
//! encryption call in the subsystem. Each encryption operation generates
//! a unique random nonce, and the output is packed into a single base64
//! string (nonce followed by ciphertext and tag) so callers can persist
//! it as one opaque field.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{TallyError, TallyResult};

/// Size of an AES-256 key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key, zeroed on drop
///
/// Use this for the vault key and any other AES-256 key material.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; KEY_SIZE],
}

impl VaultKey {
    /// Generate a fresh random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create a key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> TallyResult<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(TallyError::Encryption(format!(
                "Invalid key size: expected {}, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Parse a key from its base64 encoding
    pub fn from_base64(encoded: &str) -> TallyResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| TallyError::Encryption(format!("Invalid key encoding: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Parse a key from its hex encoding
    pub fn from_hex(encoded: &str) -> TallyResult<Self> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| TallyError::Encryption(format!("Invalid key encoding: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Encode the key as base64 (for writing into a new secrets bundle)
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.key)
    }
}

// Never print key material in Debug output
impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey").finish_non_exhaustive()
    }
}

/// Encrypt plaintext with AES-256-GCM
///
/// Generates a random nonce for each call and returns a single base64
/// string laid out as `nonce || ciphertext+tag`.
pub fn encrypt(key: &VaultKey, plaintext: &[u8]) -> TallyResult<String> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| TallyError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| TallyError::Encryption(format!("Encryption failed: {}", e)))?;

    let mut packed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    packed.extend_from_slice(&nonce_bytes);
    packed.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(packed))
}

/// Decrypt a base64 `nonce || ciphertext+tag` payload with AES-256-GCM
///
/// All failure modes (bad encoding, truncated input, tag mismatch, wrong
/// key) collapse to a single `Authentication` error: callers must treat
/// failure as fatal for the operation, never as recoverable garbage.
pub fn decrypt(key: &VaultKey, encoded: &str) -> TallyResult<Vec<u8>> {
    let packed = STANDARD
        .decode(encoded.trim())
        .map_err(|_| TallyError::Authentication("invalid payload encoding".to_string()))?;

    if packed.len() < NONCE_SIZE + TAG_SIZE {
        return Err(TallyError::Authentication(
            "payload too short to contain nonce and tag".to_string(),
        ));
    }

    let (nonce_bytes, ciphertext) = packed.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| TallyError::Encryption(format!("Failed to create cipher: {}", e)))?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| TallyError::Authentication("invalid key or corrupted data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = VaultKey::generate();
        let plaintext = b"access-sandbox-1234";

        let encrypted = encrypt(&key, plaintext).unwrap();
        let decrypted = decrypt(&key, &encrypted).unwrap();

        assert_eq!(plaintext, decrypted.as_slice());
    }

    #[test]
    fn test_different_nonces() {
        let key = VaultKey::generate();
        let plaintext = b"access-sandbox-1234";

        let encrypted1 = encrypt(&key, plaintext).unwrap();
        let encrypted2 = encrypt(&key, plaintext).unwrap();

        // Same plaintext must never produce identical output (random nonces)
        assert_ne!(encrypted1, encrypted2);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = VaultKey::generate();
        let key2 = VaultKey::generate();
        let encrypted = encrypt(&key1, b"token").unwrap();

        let result = decrypt(&key2, &encrypted);
        assert!(matches!(result, Err(TallyError::Authentication(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = VaultKey::generate();
        let encrypted = encrypt(&key, b"token").unwrap();

        let mut packed = STANDARD.decode(&encrypted).unwrap();
        let last = packed.len() - 1;
        packed[last] ^= 0x01;
        let tampered = STANDARD.encode(&packed);

        let result = decrypt(&key, &tampered);
        assert!(matches!(result, Err(TallyError::Authentication(_))));
    }

    #[test]
    fn test_truncated_payload_fails() {
        let key = VaultKey::generate();
        let result = decrypt(&key, &STANDARD.encode([0u8; 8]));
        assert!(matches!(result, Err(TallyError::Authentication(_))));
    }

    #[test]
    fn test_garbage_encoding_fails() {
        let key = VaultKey::generate();
        let result = decrypt(&key, "not base64!!!");
        assert!(matches!(result, Err(TallyError::Authentication(_))));
    }

    #[test]
    fn test_empty_plaintext() {
        let key = VaultKey::generate();
        let encrypted = encrypt(&key, b"").unwrap();
        let decrypted = decrypt(&key, &encrypted).unwrap();
        assert!(decrypted.is_empty());
    }

    #[test]
    fn test_key_base64_round_trip() {
        let key = VaultKey::generate();
        let restored = VaultKey::from_base64(&key.to_base64()).unwrap();
        assert_eq!(key.as_bytes(), restored.as_bytes());
    }

    #[test]
    fn test_key_from_hex() {
        let key = VaultKey::generate();
        let restored = VaultKey::from_hex(&hex::encode(key.as_bytes())).unwrap();
        assert_eq!(key.as_bytes(), restored.as_bytes());
    }

    #[test]
    fn test_key_wrong_size_rejected() {
        assert!(VaultKey::from_bytes(&[0u8; 16]).is_err());
    }

    #[test]
    fn test_key_debug_redacted() {
        let key = VaultKey::generate();
        let debug = format!("{:?}", key);
        assert!(!debug.contains(&hex::encode(key.as_bytes())));
    }
}
