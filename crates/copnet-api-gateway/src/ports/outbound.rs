//! Outbound ports for the API Gateway.

use crate::domain::error::GatewayError;
use async_trait::async_trait;
use copnet_paper_contract::prelude::ClientIdentity;

/// A committed transaction as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    /// Transaction id
    pub tx_id: String,
    /// Contract payload bytes
    pub payload: Vec<u8>,
}

/// Connection to the ledger network on behalf of one identity.
///
/// `submit` orders and commits; `evaluate` runs against current state and
/// writes nothing.
#[async_trait]
pub trait LedgerNetwork: Send + Sync {
    /// Identity every call is made as.
    fn identity(&self) -> &ClientIdentity;

    /// Submit a transaction and wait for its commit.
    async fn submit(&self, function: &str, args: &[String]) -> Result<Submitted, GatewayError>;

    /// Evaluate a transaction without committing it.
    async fn evaluate(&self, function: &str, args: &[String]) -> Result<Vec<u8>, GatewayError>;
}
