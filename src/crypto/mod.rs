//! Cryptographic functions for Tally
//!
//! Provides AES-256-GCM authenticated encryption for stored credentials
//! and X25519-based multi-recipient encryption for the secrets store.

pub mod aead;
pub mod file_encryption;
pub mod keypair;

pub use aead::{decrypt, encrypt, VaultKey};
pub use file_encryption::{decrypt_file, encrypt_file, EncryptedFile};
pub use keypair::{Identity, Recipient};
