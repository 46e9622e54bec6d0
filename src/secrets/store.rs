//! Per-environment encrypted secrets storage
//!
//! Bridges the path configuration, the asymmetric file encryptor, and
//! the bundle document. Application bootstrap calls `load` exactly once
//! per process and passes the resulting bundle (and its vault key) down
//! by value; there is no process-wide secrets singleton.

use crate::config::{Environment, SecretsPaths};
use crate::crypto::file_encryption::EncryptedFile;
use crate::crypto::{Identity, Recipient};
use crate::error::{TallyError, TallyResult};
use crate::secrets::bundle::SecretsBundle;

/// Store for per-environment encrypted secrets files
pub struct SecretsStore {
    paths: SecretsPaths,
}

impl SecretsStore {
    /// Create a store over the given path configuration
    pub fn new(paths: SecretsPaths) -> Self {
        Self { paths }
    }

    /// The underlying path configuration
    pub fn paths(&self) -> &SecretsPaths {
        &self.paths
    }

    /// Whether an environment's encrypted secrets file exists
    pub fn exists(&self, environment: Environment) -> bool {
        self.paths.secrets_file(environment).exists()
    }

    /// Load an environment's private identity
    pub fn identity(&self, environment: Environment) -> TallyResult<Identity> {
        Identity::load(&self.paths.identity_file(environment))
    }

    /// Decrypt and parse an environment's secrets bundle
    ///
    /// Fails with a descriptive configuration error when the identity
    /// file or the encrypted secrets file is missing at its configured
    /// path, and with a decryption error when the identity does not
    /// match the file's recipients.
    pub fn load(&self, environment: Environment) -> TallyResult<SecretsBundle> {
        let identity = self.identity(environment)?;
        let secrets_path = self.paths.secrets_file(environment);

        let encrypted = EncryptedFile::read(&secrets_path)?;
        let plaintext = encrypted.decrypt(&identity, &secrets_path.display().to_string())?;

        let contents = String::from_utf8(plaintext).map_err(|e| {
            TallyError::Json(format!(
                "Decrypted secrets for {} are not valid UTF-8: {}",
                environment, e
            ))
        })?;

        SecretsBundle::from_json(&contents)
    }

    /// Decrypt an environment's secrets file to its raw document text
    ///
    /// Used by the edit workflow, which round-trips the exact document
    /// rather than a re-serialized form.
    pub fn load_document(&self, environment: Environment) -> TallyResult<String> {
        let identity = self.identity(environment)?;
        let secrets_path = self.paths.secrets_file(environment);

        let encrypted = EncryptedFile::read(&secrets_path)?;
        let plaintext = encrypted.decrypt(&identity, &secrets_path.display().to_string())?;

        String::from_utf8(plaintext).map_err(|e| {
            TallyError::Json(format!(
                "Decrypted secrets for {} are not valid UTF-8: {}",
                environment, e
            ))
        })
    }

    /// Recipients an environment's existing encrypted file is addressed to
    ///
    /// Editing re-encrypts to the same recipient set, so team members
    /// added during key rotation keep their access.
    pub fn recipients(&self, environment: Environment) -> TallyResult<Vec<Recipient>> {
        let encrypted = EncryptedFile::read(&self.paths.secrets_file(environment))?;
        encrypted
            .recipients
            .iter()
            .map(|s| Recipient::from_hex(&s.public_key))
            .collect()
    }

    /// Validate, encrypt, and atomically write an environment's document
    ///
    /// The document must parse as a schema-conformant bundle before any
    /// bytes reach disk; the previous encrypted file is replaced only
    /// after the full encryption step succeeds.
    pub fn save_document(
        &self,
        environment: Environment,
        document: &str,
        recipients: &[Recipient],
    ) -> TallyResult<()> {
        // Refuse to persist a document the loader could not read back
        SecretsBundle::from_json(document)?;

        let encrypted = EncryptedFile::encrypt(document.as_bytes(), recipients)?;
        encrypted.write(&self.paths.secrets_file(environment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with_identity(temp_dir: &TempDir, environment: Environment) -> (SecretsStore, Identity) {
        let paths = SecretsPaths::with_dirs(
            temp_dir.path().join("keys"),
            temp_dir.path().join("secrets"),
        );
        let identity = Identity::generate();
        identity.save(&paths.identity_file(environment)).unwrap();
        (SecretsStore::new(paths), identity)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let (store, identity) = store_with_identity(&temp_dir, Environment::Development);

        let document = SecretsBundle::template().to_json_pretty().unwrap();
        store
            .save_document(Environment::Development, &document, &[identity.recipient()])
            .unwrap();

        let bundle = store.load(Environment::Development).unwrap();
        assert_eq!(bundle.bank_integration.client_id, "replace-me");
        bundle.vault_key().unwrap();
    }

    #[test]
    fn test_load_missing_identity_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SecretsPaths::with_dirs(
            temp_dir.path().join("keys"),
            temp_dir.path().join("secrets"),
        );
        let store = SecretsStore::new(paths.clone());

        let err = store.load(Environment::Production).unwrap_err();
        match err {
            TallyError::Config(msg) => {
                assert!(msg.contains(&paths.identity_file(Environment::Production).display().to_string()))
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_secrets_file_names_path() {
        let temp_dir = TempDir::new().unwrap();
        let (store, _identity) = store_with_identity(&temp_dir, Environment::Development);

        let err = store.load(Environment::Development).unwrap_err();
        match err {
            TallyError::Config(msg) => assert!(msg.contains("development.enc.json")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_environment_identity_cannot_decrypt() {
        let temp_dir = TempDir::new().unwrap();
        let paths = SecretsPaths::with_dirs(
            temp_dir.path().join("keys"),
            temp_dir.path().join("secrets"),
        );

        let prod_identity = Identity::generate();
        prod_identity
            .save(&paths.identity_file(Environment::Production))
            .unwrap();
        let dev_identity = Identity::generate();
        dev_identity
            .save(&paths.identity_file(Environment::Development))
            .unwrap();

        let store = SecretsStore::new(paths);
        let document = SecretsBundle::template().to_json_pretty().unwrap();
        store
            .save_document(
                Environment::Production,
                &document,
                &[prod_identity.recipient()],
            )
            .unwrap();

        // Point the development identity at the production file
        let encrypted =
            EncryptedFile::read(&store.paths().secrets_file(Environment::Production)).unwrap();
        let err = encrypted.decrypt(&dev_identity, "production.enc.json").unwrap_err();
        assert!(matches!(err, TallyError::Decryption { .. }));
    }

    #[test]
    fn test_save_rejects_malformed_document() {
        let temp_dir = TempDir::new().unwrap();
        let (store, identity) = store_with_identity(&temp_dir, Environment::Development);

        let result = store.save_document(
            Environment::Development,
            "{\"not\": \"a bundle\"}",
            &[identity.recipient()],
        );
        assert!(result.is_err());
        assert!(!store.exists(Environment::Development));
    }
}
