//! # Adapters Layer
//!
//! Implementations of the driven ports.
//!
//! - `memory_ledger`: transactional in-memory world state
//! - `selector`: rich-query evaluator used by the in-memory ledger

pub mod memory_ledger;
pub mod selector;

pub use memory_ledger::*;
pub use selector::*;
