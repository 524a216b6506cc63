//! Shared types for the boilerplate configuration system
//!
//! This crate contains the domain types shared by the configuration loader,
//! the validator and the binaries that consume them.

pub mod environment;
pub mod error;
pub mod utils;

// Re-export commonly used types
pub use environment::Environment;
pub use error::{ConfigError, LoadError, Result, ValidationError, ValidationRule};
