//! Shared types and models for the Kedai POS platform
//!
//! This crate holds the domain rules that do not touch storage: pricing,
//! payment method parsing, stock arithmetic, the production and sale state
//! machines, and the daily cost rollup. It is used by the backend and, via
//! WASM, by the cashier UI.

pub mod models;
pub mod payment;
pub mod pricing;
pub mod stock;
pub mod types;
pub mod validation;

pub use models::*;
pub use payment::*;
pub use pricing::*;
pub use stock::*;
pub use types::*;
pub use validation::*;
