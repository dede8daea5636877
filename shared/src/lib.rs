//! Shared types and models for the PrismaTech point-of-sale platform
//!
//! This crate contains the domain model and pure business math shared
//! between the backend and its tests. It performs no I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
