//! Storage layer for the secrets subsystem
//!
//! Provides JSON file storage with atomic writes and the credential
//! persistence contract consumed by the vault.

pub mod credentials;
pub mod file_io;

pub use credentials::{CredentialStore, JsonCredentialStore};
pub use file_io::{read_json_required, write_json_atomic};
