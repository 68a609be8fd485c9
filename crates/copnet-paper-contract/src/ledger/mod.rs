//! # Ledger Layer
//!
//! Typed store and query helpers over the [`WorldState`](crate::ports::WorldState) port.

pub mod paper_list;
pub mod queries;
pub mod state_list;

pub use paper_list::PaperList;
pub use queries::{named_query, HistoryRecords, PaperQueries};
pub use state_list::StateList;
