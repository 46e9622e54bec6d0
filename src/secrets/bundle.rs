//! The decrypted secrets document
//!
//! A bundle is the total structured contents of one environment's secret
//! store: bank-integration credentials, the database master encryption
//! key, and any additional top-level keys passed through opaquely. The
//! configuration loader only ever sees a bundle after a successful
//! decrypt and schema-conformant parse.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::crypto::VaultKey;
use crate::error::{TallyError, TallyResult};

/// Which side of the bank-data provider the credentials target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankEnvironment {
    /// Provider sandbox with synthetic data
    Sandbox,
    /// Provider development tier
    Development,
    /// Live production credentials
    Production,
}

/// Bank-data integration credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct BankIntegration {
    /// API client identifier
    pub client_id: String,
    /// API client secret
    pub secret: String,
    /// Provider environment the credentials belong to
    pub environment: BankEnvironment,
}

// Never print the client secret in Debug output
impl fmt::Debug for BankIntegration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BankIntegration")
            .field("client_id", &self.client_id)
            .field("secret", &"[REDACTED]")
            .field("environment", &self.environment)
            .finish()
    }
}

/// Database secrets
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseSecrets {
    /// Master encryption key for stored credentials (base64 or hex)
    pub encryption_key: String,
}

impl fmt::Debug for DatabaseSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSecrets")
            .field("encryption_key", &"[REDACTED]")
            .finish()
    }
}

/// One environment's decrypted secrets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretsBundle {
    /// Bank-data integration credentials
    pub bank_integration: BankIntegration,

    /// Database secrets, including the credential-vault key
    pub database: DatabaseSecrets,

    /// Additional top-level keys, passed through opaquely
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl SecretsBundle {
    /// Parse a bundle from its JSON document form
    pub fn from_json(contents: &str) -> TallyResult<Self> {
        serde_json::from_str(contents)
            .map_err(|e| TallyError::Json(format!("Invalid secrets document: {}", e)))
    }

    /// Render the bundle as pretty JSON for operator editing
    pub fn to_json_pretty(&self) -> TallyResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TallyError::Json(format!("Failed to serialize secrets document: {}", e)))
    }

    /// Template for a new environment's bundle
    ///
    /// Ships placeholder bank credentials and a freshly generated vault
    /// key, so a new environment is usable as soon as the operator fills
    /// in the provider values.
    pub fn template() -> Self {
        Self {
            bank_integration: BankIntegration {
                client_id: "replace-me".to_string(),
                secret: "replace-me".to_string(),
                environment: BankEnvironment::Sandbox,
            },
            database: DatabaseSecrets {
                encryption_key: VaultKey::generate().to_base64(),
            },
            extra: serde_json::Map::new(),
        }
    }

    /// Names of every top-level key in the bundle
    pub fn key_names(&self) -> Vec<String> {
        let mut names = vec!["bank_integration".to_string(), "database".to_string()];
        names.extend(self.extra.keys().cloned());
        names
    }

    /// Look up a top-level key by name
    ///
    /// The error on a missing key enumerates the available key NAMES to
    /// aid operators; secret values never appear in diagnostics.
    pub fn get(&self, name: &str) -> TallyResult<Value> {
        match name {
            "bank_integration" => serde_json::to_value(&self.bank_integration)
                .map_err(|e| TallyError::Json(e.to_string())),
            "database" => {
                serde_json::to_value(&self.database).map_err(|e| TallyError::Json(e.to_string()))
            }
            other => self.extra.get(other).cloned().ok_or_else(|| {
                TallyError::Config(format!(
                    "Secret '{}' not present in bundle (available keys: {})",
                    other,
                    self.key_names().join(", ")
                ))
            }),
        }
    }

    /// Decode the database encryption key into a vault key
    ///
    /// Accepts base64 first, then hex. The key value itself never
    /// appears in the error message.
    pub fn vault_key(&self) -> TallyResult<VaultKey> {
        VaultKey::from_base64(&self.database.encryption_key)
            .or_else(|_| VaultKey::from_hex(&self.database.encryption_key))
            .map_err(|_| {
                TallyError::Config(
                    "database.encryption_key is not a valid base64 or hex 256-bit key".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> String {
        format!(
            r#"{{
                "bank_integration": {{
                    "client_id": "client-1",
                    "secret": "hunter2",
                    "environment": "sandbox"
                }},
                "database": {{ "encryption_key": "{}" }},
                "feature_flags": {{ "auto_categorize": true }}
            }}"#,
            VaultKey::generate().to_base64()
        )
    }

    #[test]
    fn test_parse_and_render_round_trip() {
        let bundle = SecretsBundle::from_json(&sample_json()).unwrap();
        let rendered = bundle.to_json_pretty().unwrap();
        let reparsed = SecretsBundle::from_json(&rendered).unwrap();

        assert_eq!(reparsed.bank_integration.client_id, "client-1");
        assert_eq!(
            reparsed.bank_integration.environment,
            BankEnvironment::Sandbox
        );
        assert!(reparsed.extra.contains_key("feature_flags"));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let result = SecretsBundle::from_json(r#"{"database": {"encryption_key": "x"}}"#);
        assert!(matches!(result, Err(TallyError::Json(_))));
    }

    #[test]
    fn test_get_known_and_extra_keys() {
        let bundle = SecretsBundle::from_json(&sample_json()).unwrap();

        assert!(bundle.get("bank_integration").is_ok());
        assert!(bundle.get("feature_flags").is_ok());
    }

    #[test]
    fn test_get_missing_key_lists_names_not_values() {
        let bundle = SecretsBundle::from_json(&sample_json()).unwrap();

        let err = bundle.get("mail").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("feature_flags"));
        assert!(msg.contains("bank_integration"));
        assert!(!msg.contains("hunter2"));
    }

    #[test]
    fn test_vault_key_base64_and_hex() {
        let key = VaultKey::generate();

        let mut bundle = SecretsBundle::template();
        bundle.database.encryption_key = key.to_base64();
        assert_eq!(bundle.vault_key().unwrap().as_bytes(), key.as_bytes());

        bundle.database.encryption_key = hex::encode(key.as_bytes());
        assert_eq!(bundle.vault_key().unwrap().as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_vault_key_invalid_never_echoes_value() {
        let mut bundle = SecretsBundle::template();
        bundle.database.encryption_key = "super-secret-but-invalid".to_string();

        let msg = bundle.vault_key().unwrap_err().to_string();
        assert!(!msg.contains("super-secret-but-invalid"));
    }

    #[test]
    fn test_template_has_usable_vault_key() {
        let bundle = SecretsBundle::template();
        bundle.vault_key().unwrap();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let bundle = SecretsBundle::from_json(&sample_json()).unwrap();
        let debug = format!("{:?}", bundle);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }
}
