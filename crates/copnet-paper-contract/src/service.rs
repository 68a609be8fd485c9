//! # Contract Service
//!
//! Runs contract functions inside ledger transactions on behalf of a caller.
//!
//! - `submit_transaction`: invoke, then commit on success or discard on error
//! - `evaluate_transaction`: invoke, always discard
//!
//! Every call gets a fresh transaction id.

use crate::context::TransactionContext;
use crate::contract::{ContractConfig, VdxPaperContract};
use crate::dispatch::invoke;
use crate::domain::value_objects::{ClientIdentity, TxId};
use crate::errors::{ConfigError, ContractError};
use crate::ports::outbound::TransactionalLedger;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Contract service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// Contract configuration.
    pub contract: ContractConfig,
    /// Log payloads of committed transactions at debug level.
    pub log_payloads: bool,
}

impl ServiceConfig {
    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// The first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.contract.validate()
    }
}

/// Counters kept by the service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Submit calls received.
    pub submitted: u64,
    /// Submits that committed.
    pub committed: u64,
    /// Submits and evaluates that failed.
    pub failed: u64,
    /// Evaluate calls received.
    pub evaluated: u64,
}

/// Result of a committed submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResult {
    /// Committed transaction id.
    pub tx_id: TxId,
    /// Function payload (JSON).
    pub payload: Vec<u8>,
    /// Block height of the commit.
    pub block_height: u64,
}

/// Contract bound to a transactional ledger.
pub struct PaperContractService<L: TransactionalLedger> {
    ledger: L,
    contract: VdxPaperContract,
    config: ServiceConfig,
    stats: Arc<RwLock<ServiceStats>>,
}

impl<L: TransactionalLedger> PaperContractService<L> {
    /// Build a service.
    ///
    /// # Errors
    ///
    /// Invalid configuration.
    pub fn new(ledger: L, config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ledger,
            contract: VdxPaperContract::new(config.contract.clone()),
            config,
            stats: Arc::new(RwLock::new(ServiceStats::default())),
        })
    }

    /// Underlying ledger.
    #[must_use]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Contract instance.
    #[must_use]
    pub fn contract(&self) -> &VdxPaperContract {
        &self.contract
    }

    /// Snapshot of the counters.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Invoke a function and commit its writes.
    ///
    /// # Errors
    ///
    /// The contract's error, or `MvccReadConflict` if the commit loses a race.
    #[instrument(skip(self, args), fields(caller = %identity.id, msp_id = %identity.msp_id))]
    pub async fn submit_transaction(
        &self,
        identity: &ClientIdentity,
        function: &str,
        args: &[String],
    ) -> Result<SubmitResult, ContractError> {
        self.stats.write().await.submitted += 1;

        let tx_id = TxId::generate();
        let tx = self.ledger.begin(tx_id.clone(), identity.clone());
        let outcome = {
            let ctx = TransactionContext::new(&tx, identity.clone(), tx_id.clone(), chrono::Utc::now());
            invoke(&self.contract, &ctx, function, args).await
        };

        let payload = match outcome {
            Ok(payload) => payload,
            Err(err) => {
                warn!(tx_id = %tx_id, code = %err.code(), error = %err, "transaction rejected");
                self.stats.write().await.failed += 1;
                return Err(err);
            }
        };

        let receipt = match self.ledger.commit(tx) {
            Ok(receipt) => receipt,
            Err(err) => {
                warn!(tx_id = %tx_id, error = %err, "commit failed");
                self.stats.write().await.failed += 1;
                return Err(err.into());
            }
        };
        self.stats.write().await.committed += 1;

        if self.config.log_payloads {
            debug!(payload = %String::from_utf8_lossy(&payload), "committed payload");
        }
        info!(
            tx_id = %receipt.tx_id,
            height = receipt.block_height,
            writes = receipt.written_keys.len(),
            "transaction committed"
        );
        Ok(SubmitResult {
            tx_id: receipt.tx_id,
            payload,
            block_height: receipt.block_height,
        })
    }

    /// Invoke a function without committing.
    ///
    /// # Errors
    ///
    /// The contract's error.
    #[instrument(skip(self, args), fields(caller = %identity.id, msp_id = %identity.msp_id))]
    pub async fn evaluate_transaction(
        &self,
        identity: &ClientIdentity,
        function: &str,
        args: &[String],
    ) -> Result<Vec<u8>, ContractError> {
        self.stats.write().await.evaluated += 1;

        let tx_id = TxId::generate();
        let tx = self.ledger.begin(tx_id.clone(), identity.clone());
        let ctx = TransactionContext::new(&tx, identity.clone(), tx_id, chrono::Utc::now());
        let outcome = invoke(&self.contract, &ctx, function, args).await;
        if let Err(err) = &outcome {
            debug!(code = %err.code(), error = %err, "evaluation failed");
            self.stats.write().await.failed += 1;
        }
        outcome
    }
}

/// Service over a fresh in-memory ledger, for tests and demos.
#[must_use]
pub fn create_test_service() -> PaperContractService<crate::adapters::InMemoryLedger> {
    PaperContractService {
        ledger: crate::adapters::InMemoryLedger::new(),
        contract: VdxPaperContract::default(),
        config: ServiceConfig::default(),
        stats: Arc::new(RwLock::new(ServiceStats::default())),
    }
}

// =============================================================================
// TESTS
// =============================================================================
