//! Configuration management for boilerplate services
//!
//! This crate maps `BOILERPLATE_*` environment variables onto a typed
//! configuration and validates it before the service starts.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_from_env, ConfigLoader, EnvLoader, DEFAULT_PREFIX};
pub use schema::*;
pub use validation::{validate, Advisory, ConfigValidator};
pub use types::{ConfigError, Environment, LoadError, ValidationError, ValidationRule};
