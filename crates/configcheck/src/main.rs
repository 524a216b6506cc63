//! configcheck - load, validate and report service configuration

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use config::{Config, ConfigLoader, EnvLoader, DEFAULT_PREFIX};
use std::io::{self, ErrorKind};
use tracing::{info, warn};

mod logging;

/// Load configuration from the environment and check that it is usable
#[derive(Debug, Parser)]
#[command(name = "configcheck", version, about)]
struct Cli {
    /// Prefix of the environment variables to read
    #[arg(long, default_value = DEFAULT_PREFIX)]
    prefix: String,

    /// Print the effective configuration (password masked)
    #[arg(long, value_enum)]
    print: Option<OutputFormat>,

    /// Do not read a .env file from the working directory
    #[arg(long)]
    no_dotenv: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = EnvLoader::with_prefix(cli.prefix.as_str());

    // Loader events go to stderr until the logging section is known
    let bootstrap = logging::bootstrap_subscriber(logging::bootstrap_filter(), io::stderr);
    let config = tracing::subscriber::with_default(bootstrap, || {
        if !cli.no_dotenv {
            load_dotenv();
        }
        ConfigLoader::load_with(&loader)
    })
    .context("Failed to load configuration")?;

    let logging = config
        .logging
        .as_ref()
        .context("Logging configuration missing")?;
    logging::init(logging)?;

    report(&config, loader.prefix());

    if let Some(format) = cli.print {
        println!("{}", render(&config.redacted(), format)?);
    }

    Ok(())
}

fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment variables from {}", path.display()),
        Err(dotenv::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!("Could not load .env file: {}", e),
    }
}

fn report(config: &Config, prefix: &str) {
    info!("Configuration loaded from {}* variables", prefix);
    if let Some(service) = &config.service {
        info!(
            service = %service.name,
            version = %service.version,
            environment = %service.environment,
            "Service identity"
        );
    }
    if let Some(server) = &config.server {
        info!("Server: {}:{}", server.host, server.port);
    }
    info!("Configuration is valid");
}

fn render(config: &Config, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(config).context("Failed to serialize configuration as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(config).context("Failed to serialize configuration as YAML")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{DatabaseConfig, ServerConfig};
    use std::time::Duration;

    fn sample() -> Config {
        Config {
            server: Some(ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                read_timeout: Duration::from_secs(5),
                write_timeout: Duration::from_secs(5),
                idle_timeout: Duration::from_secs(60),
                shutdown_timeout: Duration::from_secs(15),
            }),
            database: Some(DatabaseConfig {
                password: "hunter2".to_string(),
                ..DatabaseConfig::default()
            }),
            ..Config::default()
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["configcheck"]);
        assert_eq!(cli.prefix, "BOILERPLATE_");
        assert!(cli.print.is_none());
        assert!(!cli.no_dotenv);

        let cli = Cli::parse_from(["configcheck", "--prefix", "ORDERS_", "--print", "yaml"]);
        assert_eq!(cli.prefix, "ORDERS_");
        assert!(matches!(cli.print, Some(OutputFormat::Yaml)));
    }

    #[test]
    fn test_render_json_masks_password() {
        let json = render(&sample().redacted(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["server"]["port"], 8080);
        assert_eq!(value["server"]["idle_timeout"], "1m0s");
        assert_eq!(value["database"]["password"], "********");
        assert!(value["logging"].is_null());
    }

    #[test]
    fn test_render_yaml() {
        let yaml = render(&sample().redacted(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("server:"));
        assert!(yaml.contains("read_timeout: 5s"));
        assert!(!yaml.contains("hunter2"));
    }
}
