use crate::backend::{LedgerBackend, LedgerError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Singleton key for the insertion-ordered user index.
pub const USER_INDEX_KEY: &str = "UserList";

/// Singleton key for the elected committee.
pub const COMMITTEE_KEY: &str = "COMMITTEE";

/// Singleton key for the governable variables record.
pub const VARIABLES_KEY: &str = "VARIABLES";

/// Typed JSON view over a [`LedgerBackend`], shared by every engine.
///
/// All other keys are the raw entity names (user, proposal, compact) in a
/// single namespace, which is what makes name uniqueness global across
/// record kinds.
#[derive(Clone)]
pub struct LedgerStore {
    backend: Arc<dyn LedgerBackend>,
}

impl LedgerStore {
    pub fn new(backend: Arc<dyn LedgerBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn LedgerBackend> {
        Arc::clone(&self.backend)
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        self.backend.exists(key).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(key).await? {
            Some(bytes) => {
                let value = serde_json::from_slice(&bytes)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Read a singleton record, falling back to its default when absent.
    pub async fn get_json_or_default<T: DeserializeOwned + Default>(
        &self,
        key: &str,
    ) -> Result<T> {
        Ok(self.get_json(key).await?.unwrap_or_default())
    }

    pub async fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = Self::encode(value)?;
        self.backend.put(key, &bytes).await
    }

    pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Apply a multi-key write set all-or-nothing.
    ///
    /// Serialization happens before the transaction opens, so the only
    /// faults inside the bracket are backend faults, and those roll back.
    pub async fn put_atomic(&self, writes: &[(&str, Vec<u8>)]) -> Result<()> {
        self.backend.begin_transaction().await?;

        for (key, bytes) in writes {
            if let Err(e) = self.backend.put(key, bytes).await {
                self.backend.rollback_transaction().await?;
                return Err(e);
            }
        }

        self.backend.commit_transaction().await
    }
}
