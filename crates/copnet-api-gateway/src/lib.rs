//! # CopNet API Gateway
//!
//! Per-organization REST facade over the VDX paper contract. Each process
//! acts as one organization: it submits lifecycle transactions and
//! evaluates queries under that organization's identity.
//!
//! ## Architecture
//!
//! ```text
//!   HTTP client
//!       │  POST /api/{create,issue,check,treat,pay,receive,deliver}
//!       │  POST /api/query{History,Operator,Issuer,Named,Adhoc}
//!       │  GET  /api/queryAll, /health
//!       ▼
//! ┌───────────────────────────────────────────────┐
//! │ Middleware: Trace → CORS → Timeout → Limit    │
//! ├───────────────────────────────────────────────┤
//! │ handlers: body → positional args → response   │
//! ├───────────────────────────────────────────────┤
//! │ LedgerNetwork port (submit / evaluate)        │
//! └──────────────────────┬────────────────────────┘
//!                        ▼
//!          InProcessNetwork → PaperContractService
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use copnet_api_gateway::{ApiGatewayService, GatewayConfig, InProcessNetwork};
//!
//! let config = GatewayConfig::load(None)?;
//! let network = InProcessNetwork::from_config(Arc::new(create_test_service()), &config);
//! let gateway = ApiGatewayService::new(config, Arc::new(network))?;
//! gateway.start(async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod service;

pub use adapters::InProcessNetwork;
pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, GatewayError};
pub use ports::outbound::LedgerNetwork;
pub use service::ApiGatewayService;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
