//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Relays notification requests to mobile push topics
#[derive(Parser, Debug)]
#[command(name = "bulletin-rs")]
#[command(about = "Relays notification requests to mobile push topics")]
#[command(long_about = "
bulletin-rs turns created notification requests into push messages for the
'teachers' and 'students' topics and sends them through Firebase Cloud
Messaging.

EXAMPLES:
    # Start the trigger server with default configuration
    bulletin-rs serve

    # Start server on custom host and port
    bulletin-rs serve --host 0.0.0.0 --port 8080

    # Use custom configuration file
    bulletin-rs --config /etc/bulletin/bulletin.toml serve

    # Check configuration without starting server
    bulletin-rs serve --dry-run

    # Handle one request record read from a file
    bulletin-rs dispatch --request-id abc123 --file request.json

    # Handle one request record read from stdin
    echo '{\"title\":\"Snow day\",\"target\":\"all\"}' | bulletin-rs dispatch --request-id abc123
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered files in the
    /// configuration directory. Environment variable overrides still apply.
    ///
    /// Example: --config /etc/bulletin/bulletin.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` layer is loaded. Defaults to
    /// BULLETIN_APP_ENV, then development.
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging
    ///
    /// Cannot be used with --quiet.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    ///
    /// Cannot be used with --verbose.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the trigger server (default)
    ///
    /// Examples:
    ///   bulletin-rs serve                           # Start with defaults
    ///   bulletin-rs serve --host 0.0.0.0 --port 80  # Bind to all interfaces on port 80
    ///   bulletin-rs serve --dry-run                 # Validate config without starting
    Serve {
        /// Host address to bind to
        ///
        /// Default: 127.0.0.1
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        ///
        /// Default: 8080
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Takes precedence over the global --verbose/--quiet flags.
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and credentials, then exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Handle a single notification request record
    ///
    /// Reads the record's fields as a JSON object and sends the resulting
    /// notifications once. Delivery failures are logged; the exit code only
    /// reflects configuration and input errors.
    ///
    /// Examples:
    ///   bulletin-rs dispatch --request-id abc123 --file request.json
    ///   cat request.json | bulletin-rs dispatch --request-id abc123
    Dispatch {
        /// Identifier of the request record, used for log correlation
        #[arg(long, value_name = "ID", value_parser = super::validation::validate_request_id)]
        request_id: String,

        /// File containing the record JSON; stdin when omitted
        #[arg(short, long, value_name = "PATH")]
        file: Option<PathBuf>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        if let Some(Commands::Dispatch {
            file: Some(path), ..
        }) = &self.command
            && !path.is_file()
        {
            return Err(format!(
                "Request file does not exist or is not a file: '{}'",
                path.display()
            ));
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
