//! Shared types and domain logic for the Paddy Collection Management Platform
//!
//! This crate contains types shared between the backend, the desktop frontend
//! (via WASM), and other components of the system. Everything here is pure
//! computation: the ledger arithmetic lives in this crate precisely so it can
//! be exercised without a database.

pub mod deduction;
pub mod ledger;
pub mod models;
pub mod types;
pub mod validation;

pub use deduction::*;
pub use ledger::*;
pub use models::*;
pub use types::*;
pub use validation::*;
