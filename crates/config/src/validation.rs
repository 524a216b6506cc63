//! Configuration validation utilities

use crate::schema::{
    Config, DatabaseConfig, HealthChecksConfig, LoggingConfig, ServerConfig, ServiceConfig,
};
use std::time::Duration;
use types::{utils, ValidationError};

/// Accepted `logging.level` values
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Accepted postgres `sslmode` values
pub const SSL_MODES: &[&str] = &["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

/// Smallest accepted health check timeout and interval
pub const MIN_HEALTH_CHECK_PERIOD: Duration = Duration::from_secs(1);

/// Validate a loaded configuration, stopping at the first failure
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    ConfigValidator::validate(config)
}

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate complete configuration.
    ///
    /// Sections are checked for presence first, then each section in the
    /// order server, logging, database, service, health checks. Only the
    /// first failure is reported.
    pub fn validate(config: &Config) -> Result<(), ValidationError> {
        let server = required(config.server.as_ref(), "server")?;
        let logging = required(config.logging.as_ref(), "logging")?;
        let database = required(config.database.as_ref(), "database")?;
        let service = required(config.service.as_ref(), "service")?;
        let health_checks = required(config.health_checks.as_ref(), "health_checks")?;

        Self::validate_server(server)?;
        Self::validate_logging(logging)?;
        Self::validate_database(database)?;
        Self::validate_service(service)?;
        Self::validate_health_checks(health_checks)?;

        Ok(())
    }

    fn validate_server(server: &ServerConfig) -> Result<(), ValidationError> {
        require_text("server.host", &server.host)?;
        require_set("server.port", server.port)?;
        require_set("server.read_timeout", server.read_timeout)?;
        require_set("server.write_timeout", server.write_timeout)?;
        require_set("server.idle_timeout", server.idle_timeout)?;
        require_set("server.shutdown_timeout", server.shutdown_timeout)
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ValidationError> {
        require_text("logging.level", &logging.level)?;
        require_one_of("logging.level", &logging.level.to_lowercase(), LOG_LEVELS)?;

        if logging.outputs.is_empty() {
            return Err(ValidationError::required("logging.outputs"));
        }
        Ok(())
    }

    fn validate_database(database: &DatabaseConfig) -> Result<(), ValidationError> {
        require_text("database.host", &database.host)?;
        require_set("database.port", database.port)?;
        require_text("database.user", &database.user)?;
        require_text("database.name", &database.name)?;
        require_text("database.ssl_mode", &database.ssl_mode)?;
        require_one_of("database.ssl_mode", &database.ssl_mode.to_lowercase(), SSL_MODES)?;
        require_set("database.max_open_conns", database.max_open_conns)?;
        require_set("database.max_idle_conns", database.max_idle_conns)?;
        require_set("database.conn_max_lifetime", database.conn_max_lifetime)?;
        require_set("database.conn_max_idle_time", database.conn_max_idle_time)
    }

    fn validate_service(service: &ServiceConfig) -> Result<(), ValidationError> {
        require_text("service.name", &service.name)?;
        require_text("service.version", &service.version)
    }

    fn validate_health_checks(health_checks: &HealthChecksConfig) -> Result<(), ValidationError> {
        require_at_least("health_checks.timeout", health_checks.timeout, MIN_HEALTH_CHECK_PERIOD)?;
        require_at_least("health_checks.interval", health_checks.interval, MIN_HEALTH_CHECK_PERIOD)?;

        if health_checks.enabled && health_checks.checks.is_empty() {
            return Err(ValidationError::required("health_checks.checks"));
        }
        Ok(())
    }

    /// Non-fatal findings about a configuration.
    ///
    /// Advisories never change the outcome of [`ConfigValidator::validate`];
    /// absent sections are skipped.
    pub fn advisories(config: &Config) -> Vec<Advisory> {
        let mut advisories = Vec::new();
        let production = config.environment().is_production();

        if let Some(logging) = &config.logging {
            let level = logging.level.to_lowercase();
            if production && (level == "trace" || level == "debug") {
                advisories.push(Advisory::new(
                    "logging.level",
                    "Debug/trace logging may impact performance in production",
                ));
            }
        }

        if let Some(database) = &config.database {
            if production && database.ssl_mode.eq_ignore_ascii_case("disable") {
                advisories.push(Advisory::new(
                    "database.ssl_mode",
                    "TLS is disabled for the database connection in production",
                ));
            }
            if database.max_idle_conns > database.max_open_conns {
                advisories.push(Advisory::new(
                    "database.max_idle_conns",
                    format!(
                        "Max idle connections ({}) exceeds max open connections ({})",
                        database.max_idle_conns, database.max_open_conns
                    ),
                ));
            }
        }

        if let Some(health_checks) = &config.health_checks {
            if !health_checks.enabled && production {
                advisories.push(Advisory::new(
                    "health_checks.enabled",
                    "Health checks are disabled in production",
                ));
            }
            if health_checks.timeout >= health_checks.interval && !health_checks.interval.is_zero() {
                advisories.push(Advisory::new(
                    "health_checks.timeout",
                    format!(
                        "Health check timeout ({}) is not shorter than the interval ({})",
                        utils::format_duration(health_checks.timeout),
                        utils::format_duration(health_checks.interval)
                    ),
                ));
            }
        }

        advisories
    }
}

/// A non-fatal validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory {
    pub field: String,
    pub message: String,
}

impl Advisory {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn required<'a, T>(section: Option<&'a T>, name: &str) -> Result<&'a T, ValidationError> {
    section.ok_or_else(|| ValidationError::required(name))
}

fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

fn require_set<T: Default + PartialEq>(field: &str, value: T) -> Result<(), ValidationError> {
    if value == T::default() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

fn require_at_least(field: &str, value: Duration, min: Duration) -> Result<(), ValidationError> {
    if value < min {
        return Err(ValidationError::minimum(field, utils::format_duration(min)));
    }
    Ok(())
}

fn require_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), ValidationError> {
    if !allowed.contains(&value) {
        return Err(ValidationError::one_of(field, allowed));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Environment, ValidationRule};

    fn valid_config() -> Config {
        Config {
            server: Some(ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                read_timeout: Duration::from_secs(5),
                write_timeout: Duration::from_secs(10),
                idle_timeout: Duration::from_secs(60),
                shutdown_timeout: Duration::from_secs(30),
            }),
            logging: Some(LoggingConfig {
                level: "info".to_string(),
                outputs: vec!["stdout".to_string()],
            }),
            database: Some(DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "app".to_string(),
                password: String::new(),
                name: "app_db".to_string(),
                ssl_mode: "require".to_string(),
                max_open_conns: 25,
                max_idle_conns: 5,
                conn_max_lifetime: 300,
                conn_max_idle_time: 60,
            }),
            service: Some(ServiceConfig {
                name: "orders".to_string(),
                version: "1.2.3".to_string(),
                environment: Environment::Staging,
            }),
            health_checks: Some(HealthChecksConfig {
                enabled: true,
                checks: vec!["database".to_string()],
                timeout: Duration::from_secs(1),
                interval: Duration::from_secs(10),
            }),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate(&valid_config()), Ok(()));
    }

    #[test]
    fn test_missing_sections_reported_in_order() {
        let mut config = valid_config();
        config.database = None;
        config.health_checks = None;
        assert_eq!(validate(&config), Err(ValidationError::required("database")));

        assert_eq!(validate(&Config::default()), Err(ValidationError::required("server")));
    }

    #[test]
    fn test_first_failing_section_wins() {
        let mut config = valid_config();
        config.server.as_mut().unwrap().port = 0;
        config.database.as_mut().unwrap().host.clear();
        assert_eq!(validate(&config), Err(ValidationError::required("server.port")));
    }

    #[test]
    fn test_server_durations_required() {
        let mut config = valid_config();
        config.server.as_mut().unwrap().shutdown_timeout = Duration::ZERO;
        assert_eq!(
            validate(&config),
            Err(ValidationError::required("server.shutdown_timeout"))
        );
    }

    #[test]
    fn test_logging_rules() {
        let mut config = valid_config();
        config.logging.as_mut().unwrap().level = "WARN".to_string();
        assert!(validate(&config).is_ok());

        config.logging.as_mut().unwrap().level = "verbose".to_string();
        let err = validate(&config).unwrap_err();
        assert_eq!(err.field, "logging.level");
        assert!(matches!(err.rule, ValidationRule::OneOf { .. }));

        config.logging.as_mut().unwrap().level = "info".to_string();
        config.logging.as_mut().unwrap().outputs.clear();
        assert_eq!(validate(&config), Err(ValidationError::required("logging.outputs")));
    }

    #[test]
    fn test_database_password_optional_other_fields_required() {
        let config = valid_config();
        assert!(config.database.as_ref().unwrap().password.is_empty());
        assert!(validate(&config).is_ok());

        let mut config = valid_config();
        config.database.as_mut().unwrap().conn_max_idle_time = 0;
        assert_eq!(
            validate(&config),
            Err(ValidationError::required("database.conn_max_idle_time"))
        );

        let mut config = valid_config();
        config.database.as_mut().unwrap().ssl_mode = "sometimes".to_string();
        assert_eq!(validate(&config).unwrap_err().field, "database.ssl_mode");
    }

    #[test]
    fn test_service_requires_name_and_version() {
        let mut config = valid_config();
        config.service.as_mut().unwrap().version = "  ".to_string();
        assert_eq!(validate(&config), Err(ValidationError::required("service.version")));
    }

    #[test]
    fn test_health_check_minimums() {
        let mut config = valid_config();
        config.health_checks.as_mut().unwrap().timeout = Duration::from_millis(500);
        assert_eq!(
            validate(&config),
            Err(ValidationError::minimum("health_checks.timeout", "1s"))
        );

        config.health_checks.as_mut().unwrap().timeout = Duration::from_secs(1);
        assert!(validate(&config).is_ok());

        config.health_checks.as_mut().unwrap().interval = Duration::ZERO;
        assert_eq!(
            validate(&config),
            Err(ValidationError::minimum("health_checks.interval", "1s"))
        );
    }

    #[test]
    fn test_enabled_health_checks_need_checks() {
        let mut config = valid_config();
        config.health_checks.as_mut().unwrap().checks.clear();
        assert_eq!(
            validate(&config),
            Err(ValidationError::required("health_checks.checks"))
        );

        config.health_checks.as_mut().unwrap().enabled = false;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_advisories() {
        assert!(ConfigValidator::advisories(&valid_config()).is_empty());

        let mut config = valid_config();
        config.service.as_mut().unwrap().environment = Environment::Production;
        config.logging.as_mut().unwrap().level = "debug".to_string();
        config.database.as_mut().unwrap().ssl_mode = "disable".to_string();
        config.database.as_mut().unwrap().max_idle_conns = 50;
        config.health_checks.as_mut().unwrap().timeout = Duration::from_secs(10);

        let fields: Vec<String> = ConfigValidator::advisories(&config)
            .into_iter()
            .map(|advisory| advisory.field)
            .collect();
        assert_eq!(
            fields,
            vec![
                "logging.level",
                "database.ssl_mode",
                "database.max_idle_conns",
                "health_checks.timeout",
            ]
        );
        assert!(validate(&config).is_ok());
    }
}
