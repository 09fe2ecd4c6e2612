//! Logger setup
//!
//! A `tracing-subscriber` registry with:
//! - console output, colored only when stdout is a terminal
//! - optional file output in full, compact or JSON format

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use config::*;
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use writer::LogFileWriter;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber described by `config`
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let layers = build_layers(&config)?;

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| LoggerError::AlreadyInitialized {
            message: e.to_string(),
        })?;

    Ok(())
}

/// The file layer comes first so console ANSI settings do not leak into
/// span fields written to the file (tokio-rs/tracing#1817).
fn build_layers(config: &LoggerConfig) -> Result<Vec<BoxedLayer>, LoggerError> {
    let mut layers = Vec::with_capacity(2);

    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }

    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    if layers.is_empty() {
        return Err(LoggerError::config(
            "At least one output (console or file) must be enabled",
        ));
    }

    Ok(layers)
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();

    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = LogFileWriter::new(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };

    Ok(layer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_layers_console_only() {
        let layers = build_layers(&LoggerConfig::default()).unwrap();
        assert_eq!(layers.len(), 1);
    }

    #[test]
    fn test_build_layers_file_and_console() {
        let dir = TempDir::new().unwrap();
        let config = LoggerConfig {
            file: FileConfig::new(true, dir.path().join("bulletin.log"), true, LogFormat::Compact),
            ..LoggerConfig::default()
        };
        let layers = build_layers(&config).unwrap();
        assert_eq!(layers.len(), 2);
        assert!(dir.path().join("bulletin.log").exists());
    }

    #[test]
    fn test_build_layers_requires_an_output() {
        let mut config = LoggerConfig::default();
        config.console.enabled = false;
        assert!(matches!(
            build_layers(&config),
            Err(LoggerError::Config { .. })
        ));
    }
}
