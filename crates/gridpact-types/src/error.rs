use thiserror::Error;

/// Result type shared by every gridpact engine
pub type Result<T> = std::result::Result<T, GridError>;

/// Error taxonomy for all engine operations.
///
/// Every failure is synchronous and typed; a failed operation persists
/// nothing. `Ledger` wraps faults from the external key-value collaborator.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid state: expected {expected}, found {found}")]
    InvalidState { expected: String, found: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("insufficient credit: required {required}, actual {actual}")]
    Unauthorized { required: i64, actual: i64 },

    #[error("duplicate vote from voter: {0}")]
    AlreadyVoted(String),

    #[error("ledger error: {0}")]
    Ledger(String),
}
