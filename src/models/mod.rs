//! Core data models for the secrets subsystem

pub mod credential;

pub use credential::{CredentialId, CredentialRecord};
