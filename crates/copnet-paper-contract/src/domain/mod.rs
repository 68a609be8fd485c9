//! # Domain Layer
//!
//! Paper entity, value objects, lifecycle invariants and pure workflow rules.

pub mod entities;
pub mod invariants;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use invariants::*;
pub use services::*;
pub use value_objects::*;
