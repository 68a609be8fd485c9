//! In-process ledger network.
//!
//! Runs the paper contract in the gateway's own process through
//! [`PaperContractService`]. Several gateways may share one service to act
//! as different organizations on the same ledger.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::ports::outbound::{LedgerNetwork, Submitted};
use async_trait::async_trait;
use copnet_paper_contract::prelude::{ClientIdentity, PaperContractService, TransactionalLedger};
use std::sync::Arc;
use tracing::{debug, instrument};

/// [`LedgerNetwork`] backed by a local contract service.
pub struct InProcessNetwork<L: TransactionalLedger> {
    service: Arc<PaperContractService<L>>,
    identity: ClientIdentity,
    channel: String,
    contract: String,
}

impl<L: TransactionalLedger> InProcessNetwork<L> {
    /// Connect `identity` to a shared service.
    pub fn new(
        service: Arc<PaperContractService<L>>,
        identity: ClientIdentity,
        channel: impl Into<String>,
        contract: impl Into<String>,
    ) -> Self {
        Self {
            service,
            identity,
            channel: channel.into(),
            contract: contract.into(),
        }
    }

    /// Connect with the identity and addressing of a gateway config.
    pub fn from_config(service: Arc<PaperContractService<L>>, config: &GatewayConfig) -> Self {
        Self::new(
            service,
            config.identity(),
            config.network.channel.clone(),
            config.network.contract.clone(),
        )
    }

    /// Shared contract service.
    #[must_use]
    pub fn service(&self) -> &Arc<PaperContractService<L>> {
        &self.service
    }
}

#[async_trait]
impl<L> LedgerNetwork for InProcessNetwork<L>
where
    L: TransactionalLedger + 'static,
{
    fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    #[instrument(skip(self, args), fields(channel = %self.channel, contract = %self.contract))]
    async fn submit(&self, function: &str, args: &[String]) -> Result<Submitted, GatewayError> {
        let result = self
            .service
            .submit_transaction(&self.identity, function, args)
            .await?;
        debug!(tx_id = %result.tx_id, height = result.block_height, "submitted");
        Ok(Submitted {
            tx_id: result.tx_id.to_string(),
            payload: result.payload,
        })
    }

    #[instrument(skip(self, args), fields(channel = %self.channel, contract = %self.contract))]
    async fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<u8>, GatewayError> {
        Ok(self
            .service
            .evaluate_transaction(&self.identity, function, args)
            .await?)
    }
}
