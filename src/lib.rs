//! Tally secrets and credential-encryption subsystem
//!
//! This library provides the security core of the Tally personal-finance
//! aggregator: environment-scoped encrypted secrets for bootstrap
//! configuration, and a symmetric credential vault for third-party
//! access tokens stored in the application database.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Per-environment paths and editor policy
//! - `error`: Custom error types
//! - `crypto`: AEAD primitive, keypairs, and multi-recipient file encryption
//! - `secrets`: The encrypted secrets bundle and its store
//! - `models`: Credential record data model
//! - `storage`: Atomic file I/O and the credential persistence contract
//! - `vault`: Per-record encryption of stored credentials
//! - `cli`: Secrets lifecycle command handlers
//!
//! # Example
//!
//! ```rust,ignore
//! use tally::config::{Environment, SecretsPaths};
//! use tally::secrets::SecretsStore;
//!
//! let store = SecretsStore::new(SecretsPaths::new()?);
//! let bundle = store.load(Environment::Production)?;
//! let vault_key = bundle.vault_key()?;
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod error;
pub mod models;
pub mod secrets;
pub mod storage;
pub mod vault;

pub use error::{TallyError, TallyResult};
