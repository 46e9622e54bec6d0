//! CLI command handlers
//!
//! This module contains the implementation of the secrets lifecycle
//! commands, bridging the clap argument parsing with the library layers.

pub mod scratch;
pub mod secrets;

pub use scratch::ScratchFile;
pub use secrets::{decrypt_path, edit_bundle, encrypt_path, keygen, new_bundle, show_keys};
