//! Saved-post persistence tiers.
//!
//! [`RedbStore`] is the primary document store, [`MemoryStore`] the
//! process-local fallback. [`FailoverStore`] routes each operation to the
//! primary while its [`CircuitBreaker`] allows it and re-runs the operation on
//! the fallback when the primary fails.

pub mod breaker;
pub mod failover;
pub mod memory;
pub mod redb_store;

pub use self::breaker::{BreakerState, CircuitBreaker};
pub use self::failover::{FailoverStore, StorageMode};
pub use self::memory::MemoryStore;
pub use self::redb_store::RedbStore;

use thiserror::Error;

use crate::models::{SavedPostRecord, User};

/// Failure of a storage tier itself, as opposed to a domain outcome
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Store lock poisoned")]
    Poisoned,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A backend able to hold users and their saved-post records.
///
/// Calls are synchronous; async callers run them on
/// `tokio::task::spawn_blocking`. Implementations must make
/// [`insert_saved`](SavedPostStore::insert_saved) an atomic
/// check-and-insert so at most one record exists per `(user_id, post_id)`.
pub trait SavedPostStore: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Cheap liveness check
    fn ping(&self) -> StoreResult<()>;

    /// Whether any user is known at all
    fn has_users(&self) -> StoreResult<bool>;

    fn find_user(&self, user_id: &str) -> StoreResult<Option<User>>;

    fn insert_user(&self, user: &User) -> StoreResult<()>;

    /// All records of a user, newest first
    fn list_saved(&self, user_id: &str) -> StoreResult<Vec<SavedPostRecord>>;

    fn find_saved(&self, user_id: &str, post_id: &str) -> StoreResult<Option<SavedPostRecord>>;

    /// Insert unless a record for the same pair exists. Returns `false` on duplicates.
    fn insert_saved(&self, record: &SavedPostRecord) -> StoreResult<bool>;

    /// Returns `false` if there was nothing to remove
    fn remove_saved(&self, user_id: &str, post_id: &str) -> StoreResult<bool>;
}
