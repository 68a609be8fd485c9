//! Middleware stack for the API Gateway.
//!
//! Layer order: Request → Trace → CORS → Timeout → Body limit → Handler

pub mod cors;

pub use cors::create_cors_layer;
