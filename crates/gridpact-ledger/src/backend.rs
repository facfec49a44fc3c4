use async_trait::async_trait;
use gridpact_types::GridError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("no transaction in progress")]
    NoTransaction,
}

impl From<LedgerError> for GridError {
    fn from(err: LedgerError) -> Self {
        GridError::Ledger(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Contract for the external replicated key-value ledger.
///
/// The backend must apply the full read-modify-write set of one engine
/// operation atomically and serializably with respect to other operations on
/// the same keys. Engines bracket multi-key writes with
/// `begin_transaction`/`commit_transaction` so that a failure part-way
/// through leaves no partial state behind.
#[async_trait]
pub trait LedgerBackend: Send + Sync {
    /// Fetch the bytes stored under `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, overwriting any previous bytes.
    async fn put(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Existence check without deserializing.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn begin_transaction(&self) -> Result<()>;

    async fn commit_transaction(&self) -> Result<()>;

    async fn rollback_transaction(&self) -> Result<()>;
}
