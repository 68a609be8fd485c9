//! Ports for the API Gateway.

pub mod outbound;

pub use outbound::{LedgerNetwork, Submitted};
