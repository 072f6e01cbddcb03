//! Core types and utilities for the landwatch land-degradation models.
//!
//! This crate provides the error type, domain types, configuration and
//! device selection shared by the tabular and image model crates.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

pub use backend::*;
pub use config::*;
pub use error::{Error, Result};
pub use metrics::*;
pub use types::*;

/// Seed used by every synthetic generator and model unless overridden
pub const DEFAULT_SEED: u64 = 42;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::config::*;
    pub use crate::error::{Error, Result};
    pub use crate::metrics::*;
    pub use crate::types::*;
}
