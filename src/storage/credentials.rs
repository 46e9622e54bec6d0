//! Credential persistence
//!
//! Defines the storage contract the credential vault writes through, plus
//! a JSON-file-backed implementation. The store only ever sees opaque
//! encrypted payloads; it never understands their internal structure.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{TallyError, TallyResult};
use crate::models::CredentialRecord;

use super::file_io::{read_json_required, write_json_atomic};

/// Storage contract for credential records
///
/// One record per (user, institution) pair: `insert` rejects duplicates,
/// so callers replace an existing credential via `update`.
pub trait CredentialStore {
    /// Persist a new record; fails if the (user, institution) pair exists
    fn insert(&self, record: CredentialRecord) -> TallyResult<()>;

    /// Replace an existing record
    fn update(&self, record: CredentialRecord) -> TallyResult<()>;

    /// Look up the record for a (user, institution) pair
    fn find_by(&self, user_id: &str, institution: &str) -> TallyResult<Option<CredentialRecord>>;

    /// Remove the record for a (user, institution) pair
    fn delete(&self, user_id: &str, institution: &str) -> TallyResult<bool>;

    /// All records, for vault-key rotation
    fn all(&self) -> TallyResult<Vec<CredentialRecord>>;
}

/// Serializable credential data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct CredentialData {
    credentials: Vec<CredentialRecord>,
}

/// JSON-file-backed credential store
pub struct JsonCredentialStore {
    path: PathBuf,
    data: RwLock<HashMap<(String, String), CredentialRecord>>,
}

impl JsonCredentialStore {
    /// Open a store, loading existing records if the file is present
    pub fn open(path: PathBuf) -> TallyResult<Self> {
        let mut map = HashMap::new();
        if path.exists() {
            let file_data: CredentialData = read_json_required(&path)?;
            for record in file_data.credentials {
                map.insert((record.user_id.clone(), record.institution.clone()), record);
            }
        }
        Ok(Self {
            path,
            data: RwLock::new(map),
        })
    }

    /// Persist the current contents to disk
    fn save(&self, data: &HashMap<(String, String), CredentialRecord>) -> TallyResult<()> {
        let mut credentials: Vec<_> = data.values().cloned().collect();
        credentials.sort_by(|a, b| {
            a.user_id
                .cmp(&b.user_id)
                .then(a.institution.cmp(&b.institution))
        });
        write_json_atomic(&self.path, &CredentialData { credentials })
    }
}

impl CredentialStore for JsonCredentialStore {
    fn insert(&self, record: CredentialRecord) -> TallyResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let key = (record.user_id.clone(), record.institution.clone());
        if data.contains_key(&key) {
            return Err(TallyError::Storage(format!(
                "Credential already exists for {}/{}",
                record.user_id, record.institution
            )));
        }

        data.insert(key, record);
        self.save(&data)
    }

    fn update(&self, record: CredentialRecord) -> TallyResult<()> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let key = (record.user_id.clone(), record.institution.clone());
        if !data.contains_key(&key) {
            return Err(TallyError::credential_not_found(format!(
                "{}/{}",
                record.user_id, record.institution
            )));
        }

        data.insert(key, record);
        self.save(&data)
    }

    fn find_by(&self, user_id: &str, institution: &str) -> TallyResult<Option<CredentialRecord>> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .get(&(user_id.to_string(), institution.to_string()))
            .cloned())
    }

    fn delete(&self, user_id: &str, institution: &str) -> TallyResult<bool> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let removed = data
            .remove(&(user_id.to_string(), institution.to_string()))
            .is_some();
        if removed {
            self.save(&data)?;
        }
        Ok(removed)
    }

    fn all(&self) -> TallyResult<Vec<CredentialRecord>> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.values().cloned().collect())
    }
}
