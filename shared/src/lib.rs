//! Shared types and models for the Dining Waste Tracker
//!
//! This crate contains the deterministic waste calculators and report shapes
//! shared between the backend, the kiosk client (via WASM), and tests.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
