//! Adapters implementing the gateway's outbound ports.

pub mod in_process;

pub use in_process::InProcessNetwork;
