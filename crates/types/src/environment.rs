//! Runtime environment of the service

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Environment the service runs in.
///
/// Parsing never fails: unrecognised input falls back to
/// [`Environment::Development`], and rendering always yields one of
/// `development`, `staging` or `production`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Map a free-form name or alias onto an environment
    pub fn from_alias(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" | "uat" | "qa" | "testing" => Environment::Staging,
            "development" | "dev" | "develop" | "local" => Environment::Development,
            _ => Environment::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Environment::from_alias(s))
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        Environment::from_alias(value)
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        Environment::from_alias(&value)
    }
}

impl From<Environment> for String {
    fn from(value: Environment) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
