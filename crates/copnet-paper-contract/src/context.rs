//! # Transaction Context
//!
//! Everything a contract operation can see: the world-state stub, the calling
//! identity, and the transaction id and time assigned by the ledger.

use crate::domain::value_objects::{ClientIdentity, TxId};
use crate::ledger::{PaperList, PaperQueries};
use crate::ports::outbound::WorldState;
use crate::PAPER_NAMESPACE;
use chrono::{DateTime, Utc};

/// Per-invocation context handed to every contract operation.
pub struct TransactionContext<'a> {
    stub: &'a dyn WorldState,
    client: ClientIdentity,
    tx_id: TxId,
    timestamp: DateTime<Utc>,
}

impl<'a> TransactionContext<'a> {
    /// Bind a context to a world-state stub.
    pub fn new(
        stub: &'a dyn WorldState,
        client: ClientIdentity,
        tx_id: TxId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            stub,
            client,
            tx_id,
            timestamp,
        }
    }

    /// World-state stub.
    #[must_use]
    pub fn stub(&self) -> &'a dyn WorldState {
        self.stub
    }

    /// Calling identity.
    #[must_use]
    pub fn client(&self) -> &ClientIdentity {
        &self.client
    }

    /// Transaction id.
    #[must_use]
    pub fn tx_id(&self) -> &TxId {
        &self.tx_id
    }

    /// Transaction timestamp.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Paper store bound to this transaction.
    #[must_use]
    pub fn paper_list(&self) -> PaperList<'a> {
        PaperList::new(self.stub)
    }

    /// Query helpers over the paper namespace.
    #[must_use]
    pub fn queries(&self) -> PaperQueries<'a> {
        PaperQueries::new(self.stub, PAPER_NAMESPACE)
    }
}

impl std::fmt::Debug for TransactionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionContext")
            .field("client", &self.client)
            .field("tx_id", &self.tx_id)
            .field("timestamp", &self.timestamp)
            .finish_non_exhaustive()
    }
}
