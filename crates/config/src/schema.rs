//! Configuration schema definitions

use serde::{Serialize, Serializer};
use std::time::Duration;
use types::{utils, Environment};

/// Main configuration structure.
///
/// Every section is optional at load time; [`crate::validate`] rejects a
/// configuration with a missing section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: Option<ServerConfig>,
    /// Logging configuration
    pub logging: Option<LoggingConfig>,
    /// Database configuration
    pub database: Option<DatabaseConfig>,
    /// Service identity
    pub service: Option<ServiceConfig>,
    /// Health check configuration
    pub health_checks: Option<HealthChecksConfig>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    #[serde(serialize_with = "serialize_duration")]
    pub read_timeout: Duration,
    #[serde(serialize_with = "serialize_duration")]
    pub write_timeout: Duration,
    #[serde(serialize_with = "serialize_duration")]
    pub idle_timeout: Duration,
    /// Grace period for in-flight requests on shutdown
    #[serde(serialize_with = "serialize_duration")]
    pub shutdown_timeout: Duration,
}

/// Database connection and pool configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    /// Optional; an empty password is allowed
    pub password: String,
    /// Database name
    pub name: String,
    /// Postgres `sslmode`
    pub ssl_mode: String,
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    /// Maximum connection lifetime in seconds
    pub conn_max_lifetime: u64,
    /// Maximum connection idle time in seconds
    pub conn_max_idle_time: u64,
}

/// Service identity
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
    pub environment: Environment,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Destinations: `stdout`, `stderr` or a file path
    pub outputs: Vec<String>,
}

/// Health check configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthChecksConfig {
    pub enabled: bool,
    /// Names of the checks to run
    pub checks: Vec<String>,
    #[serde(serialize_with = "serialize_duration")]
    pub timeout: Duration,
    #[serde(serialize_with = "serialize_duration")]
    pub interval: Duration,
}

fn serialize_duration<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&utils::format_duration(*duration))
}

impl Config {
    /// Copy of the configuration that is safe to print or log
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(database) = config.database.as_mut() {
            database.password = utils::redact(&database.password);
        }
        config
    }

    pub fn environment(&self) -> Environment {
        self.service
            .as_ref()
            .map(|service| service.environment)
            .unwrap_or_default()
    }
}

impl DatabaseConfig {
    pub fn conn_max_lifetime_duration(&self) -> Duration {
        Duration::from_secs(self.conn_max_lifetime)
    }

    pub fn conn_max_idle_time_duration(&self) -> Duration {
        Duration::from_secs(self.conn_max_idle_time)
    }

    /// Postgres key/value connection string
    pub fn dsn(&self) -> String {
        let mut dsn = format!(
            "host={} port={} user={} dbname={} sslmode={}",
            self.host, self.port, self.user, self.name, self.ssl_mode
        );
        if !self.password.is_empty() {
            dsn.push_str(&format!(" password={}", self.password));
        }
        dsn
    }
}

impl ServiceConfig {
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}
