//! Error types for the configuration system

use std::fmt;
use thiserror::Error;

/// Main error type for loading and validating configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The environment could not be read or mapped
    #[error("Configuration load error: {0}")]
    Load(#[from] LoadError),

    /// The loaded configuration is not well-formed
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while reading the environment into a configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A prefixed variable could not be read as unicode
    #[error("Environment variable {key} is not valid unicode")]
    Environment { key: String },

    /// A value could not be coerced into its destination type
    #[error("Invalid value for {key}: '{value}' - {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

impl LoadError {
    pub fn invalid_value(key: &str, value: &str, reason: impl Into<String>) -> Self {
        LoadError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// The rule a configuration field violated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Field or section must be present and non-zero
    Required,
    /// Field must be at least `min`
    Minimum { min: String },
    /// Field must be one of `allowed`
    OneOf { allowed: Vec<String> },
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationRule::Required => write!(f, "is required"),
            ValidationRule::Minimum { min } => write!(f, "must be at least {}", min),
            ValidationRule::OneOf { allowed } => {
                write!(f, "must be one of [{}]", allowed.join(", "))
            }
        }
    }
}

/// First failing field reported by the validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration validation error: {field} {rule}")]
pub struct ValidationError {
    /// Dotted path of the offending section or field, e.g. `database.port`
    pub field: String,
    /// The violated rule
    pub rule: ValidationRule,
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self {
            field: field.to_string(),
            rule: ValidationRule::Required,
        }
    }

    pub fn minimum(field: &str, min: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            rule: ValidationRule::Minimum { min: min.into() },
        }
    }

    pub fn one_of(field: &str, allowed: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            rule: ValidationRule::OneOf {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
            },
        }
    }
}
