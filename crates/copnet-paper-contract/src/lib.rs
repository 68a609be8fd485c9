//! # CopNet Paper Contract - VDX Paper Lifecycle
//!
//! Permissioned-ledger contract tracking a VDX paper from creation to
//! delivery. Each paper moves through a fixed sequence of states; every step
//! is gated on the current operator (or, for payment, on the issuing
//! organization) and is applied as one read and one write against the world
//! state.
//!
//! ## State Machine
//!
//! | Operation | From | To | Gate | Fields written |
//! |-----------|------|----|------|----------------|
//! | `create` | - | CREATED | - | issuer org, operator = issuer |
//! | `issue` | CREATED | ISSUED | operator | `issueDateTime` |
//! | `check` | ISSUED | CHECKED | operator | - |
//! | `treat` | CHECKED | TREATED | operator | `vat` |
//! | `pay` | TREATED | PAID | issuer org | - |
//! | `receive` | PAID | RECEIVED | operator | - |
//! | `deliver` | RECEIVED | DELIVERED | operator | `fileNumber`, `deliverDateTime`, `docImma` |
//!
//! Every transition also hands the paper to the caller-named new operator and
//! records the caller's organization as operator organization.
//!
//! ## Layout
//!
//! | Layer | Location | Purpose |
//! |-------|----------|---------|
//! | Domain | `domain/` | Paper entity, state enum, transition table, invariants |
//! | Ledger | `ledger/` | Typed state list and secondary queries |
//! | Ports | `ports/` | `PaperContractApi`, `WorldState`, `TransactionalLedger` |
//! | Adapters | `adapters/` | In-memory ledger and rich-query evaluator |
//! | Dispatch | `dispatch.rs` | Name + string arguments entry point |
//! | Service | `service.rs` | Submit / evaluate over a ledger |
//!
//! ## Usage Example
//!
//! ```ignore
//! use copnet_paper_contract::prelude::*;
//!
//! let service = create_test_service();
//! let org1 = ClientIdentity::new("adminPc", "Org1MSP");
//! let args: Vec<String> = ["PC", "0001", "2020-05-01", "N", "V", "Jane", "A", "[]"]
//!     .iter().map(|s| s.to_string()).collect();
//! let result = service.submit_transaction(&org1, "create", &args).await?;
//! println!("committed {} at height {}", result.tx_id, result.block_height);
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod context;
pub mod contract;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::entities::{
        HistoryRecord, HistoryValue, LedgerState, PaperDetails, QueryRecord, VdxPaper, PAPER_CLASS,
    };
    pub use crate::domain::services::{Gatekeeper, Transition};
    pub use crate::domain::value_objects::{ClientIdentity, CompositeKey, PaperState, TxId};

    // Ports
    pub use crate::ports::inbound::{
        CheckPaper, CreatePaper, DeliverPaper, Handover, IssuePaper, PaperContractApi, PaperRef,
        PayPaper, ReceivePaper, TreatPaper,
    };
    pub use crate::ports::outbound::{
        CommitReceipt, KeyModification, KeyValue, TransactionalLedger, WorldState,
    };

    // Errors
    pub use crate::errors::{ConfigError, ContractError, ErrorCode, StateError};

    // Adapters
    pub use crate::adapters::{InMemoryLedger, LedgerTransaction, RichQuery};

    // Contract
    pub use crate::context::TransactionContext;
    pub use crate::contract::{ContractConfig, VdxPaperContract};
    pub use crate::dispatch::{invoke, ContractFunction};
    pub use crate::service::{
        create_test_service, PaperContractService, ServiceConfig, ServiceStats, SubmitResult,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Contract name, also the class discriminator of stored papers.
pub const CONTRACT_NAME: &str = "org.copnet.vdxpaper";

/// World-state namespace papers are keyed under.
pub const PAPER_NAMESPACE: &str = "org.copnet.paper";

// =============================================================================
// TESTS
// =============================================================================
