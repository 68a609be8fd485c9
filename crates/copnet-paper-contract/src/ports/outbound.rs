//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the contract depends on. The ledger platform provides them; the
//! crate ships an in-memory implementation in [`crate::adapters`].
//!
//! ## Architecture Compliance
//!
//! - Dependencies point INWARD (adapters implement these traits)
//! - The contract never sees the platform's storage engine, only key-value
//!   access with transactional semantics

use crate::domain::value_objects::{ClientIdentity, CompositeKey, TxId};
use crate::errors::StateError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// =============================================================================
// RECORDS
// =============================================================================

/// Key and value returned by range and rich queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Raw ledger key.
    pub key: String,
    /// Stored bytes.
    pub value: Vec<u8>,
}

/// One committed write to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    /// Writing transaction.
    pub tx_id: TxId,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
    /// Written bytes, empty for a delete.
    pub value: Vec<u8>,
    /// Whether the write was a delete.
    pub is_delete: bool,
}

/// Lazy, single-pass iterator over a key's history, most recent first.
pub type HistoryIterator = Box<dyn Iterator<Item = KeyModification> + Send>;

// =============================================================================
// WORLD STATE
// =============================================================================

/// Key-value view of the ledger inside one transaction.
///
/// Writes become visible to other transactions only when the surrounding
/// transaction commits. Range, rich and history queries read committed state.
#[async_trait]
pub trait WorldState: Send + Sync {
    /// Read a key. `None` if absent.
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError>;

    /// Write a key.
    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError>;

    /// Delete a key.
    async fn delete_state(&self, key: &str) -> Result<(), StateError>;

    /// All entries with `start <= key < end`, in key order.
    async fn get_state_by_range(&self, start: &str, end: &str)
        -> Result<Vec<KeyValue>, StateError>;

    /// All entries under a partial composite key, in key order.
    async fn get_state_by_partial_composite_key(
        &self,
        prefix: &CompositeKey,
    ) -> Result<Vec<KeyValue>, StateError> {
        self.get_state_by_range(prefix.as_str(), &prefix.range_end())
            .await
    }

    /// Evaluate a JSON rich query (`{"selector": {...}}`).
    async fn get_query_result(&self, query: &serde_json::Value)
        -> Result<Vec<KeyValue>, StateError>;

    /// Committed modifications of a key.
    async fn get_history_for_key(&self, key: &str) -> Result<HistoryIterator, StateError>;
}

// =============================================================================
// TRANSACTIONAL LEDGER
// =============================================================================

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Committed transaction.
    pub tx_id: TxId,
    /// Block the transaction landed in.
    pub block_height: u64,
    /// Keys written, in commit order.
    pub written_keys: Vec<String>,
    /// Commit time.
    pub timestamp: DateTime<Utc>,
}

/// A ledger that runs contract code inside transactions.
pub trait TransactionalLedger: Send + Sync {
    /// World-state view handed to the contract for one transaction.
    type Transaction: WorldState;

    /// Open a transaction for the given caller.
    fn begin(&self, tx_id: TxId, creator: ClientIdentity) -> Self::Transaction;

    /// Validate and apply the transaction's writes.
    ///
    /// # Errors
    ///
    /// `MvccReadConflict` if a key it read has changed since.
    fn commit(&self, tx: Self::Transaction) -> Result<CommitReceipt, StateError>;

    /// Committed block height.
    fn height(&self) -> u64;
}
