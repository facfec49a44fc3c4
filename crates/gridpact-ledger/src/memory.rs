use crate::backend::{LedgerBackend, LedgerError, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

type EntryMap = BTreeMap<String, Vec<u8>>;

/// In-memory ledger backend for tests and development.
///
/// Keys are held in an ordered map so scans and dumps are replay-stable.
/// Transactions snapshot the whole map; rollback restores it. That is enough
/// for the single-writer discipline the engine operations require.
pub struct MemoryLedger {
    entries: Arc<RwLock<EntryMap>>,
    backup: Arc<RwLock<Option<EntryMap>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(BTreeMap::new())),
            backup: Arc::new(RwLock::new(None)),
        }
    }

    /// Number of stored keys, for assertions in tests.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerBackend for MemoryLedger {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_vec());

        debug!(key = %key, bytes = value.len(), "ledger put");
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<()> {
        let entries = self.entries.read().await;
        let mut backup = self.backup.write().await;
        *backup = Some(entries.clone());
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;
        if backup.take().is_none() {
            return Err(LedgerError::NoTransaction);
        }
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;
        match backup.take() {
            Some(saved) => {
                let mut entries = self.entries.write().await;
                *entries = saved;
                Ok(())
            }
            None => Err(LedgerError::NoTransaction),
        }
    }
}
