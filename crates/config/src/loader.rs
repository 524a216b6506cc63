//! Configuration loader implementation

use crate::schema::{
    Config, DatabaseConfig, HealthChecksConfig, LoggingConfig, ServerConfig, ServiceConfig,
};
use crate::validation::{validate, ConfigValidator};
use figment::providers::Env;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};
use types::{utils, Environment, LoadError, Result};

/// Prefix shared by every variable this application reads
pub const DEFAULT_PREFIX: &str = "BOILERPLATE_";

/// Load configuration from `BOILERPLATE_*` environment variables
pub fn load_from_env() -> std::result::Result<Config, LoadError> {
    EnvLoader::default().load()
}

/// Maps prefixed environment variables onto [`Config`].
///
/// Keys are stripped of the prefix and lowercased; `.` and `_` both separate
/// the section from the field, so `BOILERPLATE_DB_MAX_OPEN_CONNS` and
/// `BOILERPLATE_DB.MAX_OPEN_CONNS` set the same field.
#[derive(Debug, Clone)]
pub struct EnvLoader {
    prefix: String,
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::with_prefix(DEFAULT_PREFIX)
    }
}

impl EnvLoader {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Load configuration from the process environment
    pub fn load(&self) -> std::result::Result<Config, LoadError> {
        self.ensure_unicode()?;

        let prefix = self.prefix.clone();
        let provider = Env::raw().filter_map(move |key| {
            key.as_str()
                .strip_prefix(prefix.as_str())
                .map(|rest| rest.into())
        });

        self.map_entries(
            provider
                .iter()
                .map(|(key, value)| (key.as_str().to_string(), value)),
        )
    }

    /// Load configuration from explicit `(variable, value)` pairs.
    ///
    /// Variables without the prefix are skipped, exactly as when reading the
    /// process environment.
    pub fn load_from_pairs<I, K, V>(&self, pairs: I) -> std::result::Result<Config, LoadError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries: Vec<(String, String)> = pairs
            .into_iter()
            .filter_map(|(key, value)| {
                key.as_ref()
                    .strip_prefix(self.prefix.as_str())
                    .map(|rest| (rest.to_string(), value.into()))
            })
            .collect();
        self.map_entries(entries)
    }

    // figment decodes lossily, so non-unicode values are caught up front
    fn ensure_unicode(&self) -> std::result::Result<(), LoadError> {
        for (key, value) in env::vars_os() {
            let key = key.to_string_lossy();
            if key.starts_with(self.prefix.as_str()) && value.to_str().is_none() {
                return Err(LoadError::Environment {
                    key: key.into_owned(),
                });
            }
        }
        Ok(())
    }

    fn map_entries<I>(&self, entries: I) -> std::result::Result<Config, LoadError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = Config::default();
        let mut recognised = 0usize;

        for (stripped, value) in entries {
            let key = normalize_key(&stripped);
            let variable = format!("{}{}", self.prefix, stripped.to_uppercase());
            let raw = RawValue {
                variable: &variable,
                value: &value,
            };

            let assigned = assign(&mut config.server, &key, &raw)?
                || assign(&mut config.logging, &key, &raw)?
                || assign(&mut config.database, &key, &raw)?
                || assign(&mut config.service, &key, &raw)?
                || assign(&mut config.health_checks, &key, &raw)?;

            if assigned {
                recognised += 1;
            } else {
                debug!(variable = %variable, "Ignoring unrecognised configuration variable");
            }
        }

        info!(prefix = %self.prefix, variables = recognised, "Configuration loaded from environment");
        Ok(config)
    }
}

/// Configuration loader that reads and validates in one step
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration using the default prefix
    pub fn load() -> Result<Config> {
        Self::load_with(&EnvLoader::default())
    }

    /// Load and validate configuration with a custom loader
    pub fn load_with(loader: &EnvLoader) -> Result<Config> {
        let config = loader.load()?;
        validate(&config)?;

        for advisory in ConfigValidator::advisories(&config) {
            warn!(field = %advisory.field, "{}", advisory.message);
        }

        Ok(config)
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('.', "_")
}

fn assign<S: Section>(
    slot: &mut Option<S>,
    key: &str,
    raw: &RawValue<'_>,
) -> std::result::Result<bool, LoadError> {
    let Some(field) = S::field_of(key) else {
        return Ok(false);
    };

    let existed = slot.is_some();
    let section = slot.get_or_insert_with(S::default);
    let assigned = section.assign(field, raw)?;
    if !assigned && !existed {
        *slot = None;
    }
    Ok(assigned)
}

/// A raw environment value on its way into a typed field
struct RawValue<'a> {
    variable: &'a str,
    value: &'a str,
}

impl RawValue<'_> {
    fn string(&self) -> String {
        self.value.to_string()
    }

    fn unsigned<T>(&self) -> std::result::Result<T, LoadError>
    where
        T: FromStr + Default,
        T::Err: Display,
    {
        let value = self.value.trim();
        if value.is_empty() {
            return Ok(T::default());
        }
        value
            .parse()
            .map_err(|e: T::Err| LoadError::invalid_value(self.variable, self.value, e.to_string()))
    }

    fn duration(&self) -> std::result::Result<Duration, LoadError> {
        utils::parse_duration(self.value)
            .map_err(|reason| LoadError::invalid_value(self.variable, self.value, reason))
    }

    fn boolean(&self) -> std::result::Result<bool, LoadError> {
        utils::parse_bool(self.value)
            .map_err(|reason| LoadError::invalid_value(self.variable, self.value, reason))
    }

    fn list(&self) -> Vec<String> {
        utils::parse_list(self.value)
    }

    fn environment(&self) -> Environment {
        Environment::from_alias(self.value)
    }
}

/// A configuration section addressable by name from the environment
trait Section: Default {
    const NAMES: &'static [&'static str];

    /// Set `field` from `raw`; returns false for fields this section lacks
    fn assign(&mut self, field: &str, raw: &RawValue<'_>) -> std::result::Result<bool, LoadError>;

    fn field_of(key: &str) -> Option<&str> {
        Self::NAMES.iter().find_map(|name| {
            key.strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('_'))
                .filter(|field| !field.is_empty())
        })
    }
}

impl Section for ServerConfig {
    const NAMES: &'static [&'static str] = &["server"];

    fn assign(&mut self, field: &str, raw: &RawValue<'_>) -> std::result::Result<bool, LoadError> {
        match field {
            "host" => self.host = raw.string(),
            "port" => self.port = raw.unsigned()?,
            "read_timeout" => self.read_timeout = raw.duration()?,
            "write_timeout" => self.write_timeout = raw.duration()?,
            "idle_timeout" => self.idle_timeout = raw.duration()?,
            "shutdown_timeout" => self.shutdown_timeout = raw.duration()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for LoggingConfig {
    const NAMES: &'static [&'static str] = &["logging"];

    fn assign(&mut self, field: &str, raw: &RawValue<'_>) -> std::result::Result<bool, LoadError> {
        match field {
            "level" => self.level = raw.string(),
            "outputs" => self.outputs = raw.list(),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for DatabaseConfig {
    const NAMES: &'static [&'static str] = &["db", "database"];

    fn assign(&mut self, field: &str, raw: &RawValue<'_>) -> std::result::Result<bool, LoadError> {
        match field {
            "host" => self.host = raw.string(),
            "port" => self.port = raw.unsigned()?,
            "user" => self.user = raw.string(),
            "password" => self.password = raw.string(),
            "name" => self.name = raw.string(),
            "ssl_mode" => self.ssl_mode = raw.string(),
            "max_open_conns" => self.max_open_conns = raw.unsigned()?,
            "max_idle_conns" => self.max_idle_conns = raw.unsigned()?,
            "conn_max_lifetime" => self.conn_max_lifetime = raw.unsigned()?,
            "conn_max_idle_time" => self.conn_max_idle_time = raw.unsigned()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for ServiceConfig {
    const NAMES: &'static [&'static str] = &["service"];

    fn assign(&mut self, field: &str, raw: &RawValue<'_>) -> std::result::Result<bool, LoadError> {
        match field {
            "name" => self.name = raw.string(),
            "version" => self.version = raw.string(),
            "environment" => self.environment = raw.environment(),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Section for HealthChecksConfig {
    const NAMES: &'static [&'static str] = &["health_checks", "healthchecks"];

    fn assign(&mut self, field: &str, raw: &RawValue<'_>) -> std::result::Result<bool, LoadError> {
        match field {
            "enabled" => self.enabled = raw.boolean()?,
            "checks" => self.checks = raw.list(),
            "timeout" => self.timeout = raw.duration()?,
            "interval" => self.interval = raw.duration()?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}
