//! Ledger seam for the gridpact core.
//!
//! The replicated key-value ledger itself is an external collaborator; this
//! crate defines the contract the engines program against (`LedgerBackend`),
//! a reference in-memory backend for tests and development, and the typed
//! JSON store the engines share.

pub mod backend;
pub mod memory;
pub mod store;

pub use backend::{LedgerBackend, LedgerError};
pub use memory::MemoryLedger;
pub use store::{LedgerStore, COMMITTEE_KEY, USER_INDEX_KEY, VARIABLES_KEY};
