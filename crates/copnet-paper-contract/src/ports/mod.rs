//! # Ports Layer
//!
//! - **Driving Ports (Inbound)**: `PaperContractApi`
//! - **Driven Ports (Outbound)**: `WorldState`, `TransactionalLedger`

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
