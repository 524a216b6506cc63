//! Logging setup driven by the logging section of the configuration

use anyhow::{Context, Result};
use config::LoggingConfig;
use std::env;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing::{info, Subscriber};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging.
///
/// `RUST_LOG` overrides `logging.level`; `LOG_FORMAT=json` switches to JSON
/// lines. Every entry in `logging.outputs` receives each event.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = config.level.to_lowercase();
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));
    let writer = build_writer(&config.outputs)?;

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().with_writer(writer))
                .try_init()
                .context("Failed to initialize logging")?;
        }
    }

    info!(level = %level, format = %log_format, outputs = ?config.outputs, "Logging initialized");

    Ok(())
}

/// Filter for the bootstrap subscriber: `RUST_LOG`, else `info`
pub fn bootstrap_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Subscriber used while the configuration itself is being loaded, before
/// the logging section is known.
pub fn bootstrap_subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
}

/// Combine every configured destination into one writer
pub fn build_writer(outputs: &[String]) -> Result<BoxMakeWriter> {
    let mut destinations = outputs.iter().map(|output| destination(output));

    let first = match destinations.next() {
        Some(writer) => writer?,
        None => BoxMakeWriter::new(io::stderr),
    };

    destinations.try_fold(first, |combined, next| {
        Ok(BoxMakeWriter::new(combined.and(next?)))
    })
}

fn destination(output: &str) -> Result<BoxMakeWriter> {
    let output = output.trim();
    match output.to_ascii_lowercase().as_str() {
        "stdout" => Ok(BoxMakeWriter::new(io::stdout)),
        "stderr" => Ok(BoxMakeWriter::new(io::stderr)),
        _ => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(output)
                .with_context(|| format!("Failed to open log file {}", output))?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::EnvLoader;
    use std::io::Write;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_bootstrap_subscriber_captures_loader_events() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = bootstrap_subscriber(EnvFilter::new("debug"), move || writer.clone());

        let result = tracing::subscriber::with_default(subscriber, || {
            EnvLoader::default().load_from_pairs([
                ("BOILERPLATE_SERVER_PORT", "8080"),
                ("BOILERPLATE_SERVER_HOTS", "typo"),
            ])
        });
        assert!(result.is_ok());

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Ignoring unrecognised configuration variable"));
        assert!(output.contains("BOILERPLATE_SERVER_HOTS"));
        assert!(output.contains("Configuration loaded from environment"));
    }

    #[test]
    fn test_file_outputs_receive_writes() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");

        let writer = build_writer(&[
            first.display().to_string(),
            second.display().to_string(),
        ])
        .unwrap();
        writer.make_writer().write_all(b"service started\n").unwrap();

        assert_eq!(std::fs::read_to_string(&first).unwrap(), "service started\n");
        assert_eq!(std::fs::read_to_string(&second).unwrap(), "service started\n");
    }

    #[test]
    fn test_file_output_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        std::fs::write(&path, "existing\n").unwrap();

        let writer = build_writer(&[path.display().to_string()]).unwrap();
        writer.make_writer().write_all(b"appended\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }

    #[test]
    fn test_standard_streams_and_empty_outputs() {
        assert!(build_writer(&["stdout".to_string(), "STDERR".to_string()]).is_ok());
        assert!(build_writer(&[]).is_ok());
    }

    #[test]
    fn test_unopenable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");
        assert!(build_writer(&[path.display().to_string()]).is_err());
    }
}
