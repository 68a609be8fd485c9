//! # In-Memory Ledger
//!
//! Transactional world state for tests and single-process deployments.
//!
//! A [`LedgerTransaction`] reads committed state, records the version of every
//! key it reads and buffers its writes. [`InMemoryLedger::commit`] validates
//! the read versions (MVCC), applies the writes in key order and appends one
//! history entry per written key. Dropping a transaction discards it.
//!
//! Range and rich queries are not re-validated at commit (no phantom-read
//! detection).

use crate::adapters::selector::RichQuery;
use crate::domain::value_objects::{ClientIdentity, TxId};
use crate::errors::StateError;
use crate::ports::outbound::{
    CommitReceipt, HistoryIterator, KeyModification, KeyValue, TransactionalLedger, WorldState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Version recorded for a key that does not exist.
const ABSENT: u64 = 0;

#[derive(Debug, Clone)]
struct Versioned {
    /// `None` once the key is deleted. The tombstone keeps its version so a
    /// delete never resets a key to `ABSENT`.
    value: Option<Vec<u8>>,
    /// Height of the block that last wrote the key.
    version: u64,
}

#[derive(Debug, Default)]
struct LedgerInner {
    state: BTreeMap<String, Versioned>,
    history: HashMap<String, Vec<KeyModification>>,
    height: u64,
}

impl LedgerInner {
    fn version_of(&self, key: &str) -> u64 {
        self.state.get(key).map_or(ABSENT, |v| v.version)
    }

    fn live(&self) -> impl Iterator<Item = (&String, &Vec<u8>)> {
        self.state
            .iter()
            .filter_map(|(key, v)| v.value.as_ref().map(|value| (key, value)))
    }
}

/// Shared handle to an in-memory ledger. Clones see the same state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<RwLock<LedgerInner>>,
}

impl InMemoryLedger {
    /// Empty ledger at height 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed value of a raw key.
    #[must_use]
    pub fn get_committed(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.read().state.get(key).and_then(|v| v.value.clone())
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().live().count()
    }

    /// Returns true if no key is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().live().next().is_none()
    }

    /// Number of committed writes to a key, deletes included.
    #[must_use]
    pub fn history_len(&self, key: &str) -> usize {
        self.inner.read().history.get(key).map_or(0, Vec::len)
    }
}

impl TransactionalLedger for InMemoryLedger {
    type Transaction = LedgerTransaction;

    fn begin(&self, tx_id: TxId, creator: ClientIdentity) -> LedgerTransaction {
        LedgerTransaction {
            ledger: Arc::clone(&self.inner),
            tx_id,
            creator,
            timestamp: Utc::now(),
            reads: Mutex::new(HashMap::new()),
            writes: Mutex::new(BTreeMap::new()),
        }
    }

    fn commit(&self, tx: LedgerTransaction) -> Result<CommitReceipt, StateError> {
        if !Arc::ptr_eq(&self.inner, &tx.ledger) {
            return Err(StateError::InactiveTransaction {
                tx_id: tx.tx_id.to_string(),
            });
        }

        let reads = tx.reads.into_inner();
        let writes = tx.writes.into_inner();
        let mut inner = self.inner.write();

        for (key, version) in &reads {
            if inner.version_of(key) != *version {
                warn!(tx_id = %tx.tx_id, key = %key.escape_debug(), "MVCC read conflict");
                return Err(StateError::MvccReadConflict { key: key.clone() });
            }
        }

        let height = inner.height + 1;
        let mut written_keys = Vec::with_capacity(writes.len());
        for (key, value) in writes {
            let modification = KeyModification {
                tx_id: tx.tx_id.clone(),
                timestamp: tx.timestamp,
                value: value.clone().unwrap_or_default(),
                is_delete: value.is_none(),
            };
            inner.state.insert(key.clone(), Versioned { value, version: height });
            inner.history.entry(key.clone()).or_default().push(modification);
            written_keys.push(key);
        }
        inner.height = height;

        debug!(
            tx_id = %tx.tx_id,
            creator = %tx.creator.id,
            height,
            writes = written_keys.len(),
            "transaction committed"
        );
        Ok(CommitReceipt {
            tx_id: tx.tx_id,
            block_height: height,
            written_keys,
            timestamp: tx.timestamp,
        })
    }

    fn height(&self) -> u64 {
        self.inner.read().height
    }
}

// =============================================================================
// TRANSACTION
// =============================================================================

/// World-state view of one uncommitted transaction.
pub struct LedgerTransaction {
    ledger: Arc<RwLock<LedgerInner>>,
    tx_id: TxId,
    creator: ClientIdentity,
    timestamp: DateTime<Utc>,
    reads: Mutex<HashMap<String, u64>>,
    /// `None` marks a delete.
    writes: Mutex<BTreeMap<String, Option<Vec<u8>>>>,
}

impl LedgerTransaction {
    /// Transaction id.
    #[must_use]
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    /// Submitting identity.
    #[must_use]
    pub fn creator(&self) -> &ClientIdentity {
        &self.creator
    }

    /// Time the transaction was opened.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Number of buffered writes.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.writes.lock().len()
    }
}

impl std::fmt::Debug for LedgerTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerTransaction")
            .field("tx_id", &self.tx_id)
            .field("creator", &self.creator)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WorldState for LedgerTransaction {
    async fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        let inner = self.ledger.read();
        let entry = inner.state.get(key);
        self.reads
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| entry.map_or(ABSENT, |v| v.version));
        Ok(entry.and_then(|v| v.value.clone()))
    }

    async fn put_state(&self, key: &str, value: Vec<u8>) -> Result<(), StateError> {
        self.writes.lock().insert(key.to_string(), Some(value));
        Ok(())
    }

    async fn delete_state(&self, key: &str) -> Result<(), StateError> {
        self.writes.lock().insert(key.to_string(), None);
        Ok(())
    }

    async fn get_state_by_range(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<KeyValue>, StateError> {
        if start > end {
            return Ok(Vec::new());
        }
        let inner = self.ledger.read();
        let entries = inner
            .state
            .range::<str, _>((
                std::ops::Bound::Included(start),
                std::ops::Bound::Excluded(end),
            ))
            .filter_map(|(key, v)| {
                v.value.as_ref().map(|value| KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
            })
            .collect();
        Ok(entries)
    }

    async fn get_query_result(
        &self,
        query: &serde_json::Value,
    ) -> Result<Vec<KeyValue>, StateError> {
        let query = RichQuery::parse(query)?;
        let inner = self.ledger.read();
        let mut results = Vec::new();
        for (key, value) in inner.live() {
            if query.limit().is_some_and(|limit| results.len() >= limit) {
                break;
            }
            let Ok(doc) = serde_json::from_slice::<serde_json::Value>(value) else {
                continue;
            };
            if query.matches(&doc)? {
                results.push(KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(results)
    }

    async fn get_history_for_key(&self, key: &str) -> Result<HistoryIterator, StateError> {
        let snapshot = self
            .ledger
            .read()
            .history
            .get(key)
            .cloned()
            .unwrap_or_default();
        Ok(Box::new(snapshot.into_iter().rev()))
    }
}

// =============================================================================
// TESTS
// =============================================================================
