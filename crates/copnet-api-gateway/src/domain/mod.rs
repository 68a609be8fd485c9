//! Domain types for the API Gateway.
//!
//! Configuration, request and response bodies, and error mapping.

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigError, CorsConfig, GatewayConfig, LimitsConfig, TimeoutConfig};
pub use error::{ApiError, ApiResult, GatewayError};
pub use types::*;
