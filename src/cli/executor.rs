//! Command executor for dispatching CLI commands
//!
//! This module provides the main entry point for executing CLI commands
//! after parsing and configuration loading.

use super::handlers::{DispatchCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::{Environment, Settings};
use crate::error::{AppError, AppResult};

/// Execute a CLI command with the given settings
///
/// No subcommand runs the server.
///
/// # Errors
/// Returns errors from command handlers or argument validation failures
pub async fn execute_command(cli: &Cli, settings: Settings, environment: Environment) -> AppResult<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings, environment)
                .execute(*dry_run)
                .await
        }
        None => ServeCommandHandler::new(settings, environment).execute(false).await,
        Some(Commands::Dispatch { request_id, file }) => {
            DispatchCommandHandler::new(settings)
                .execute(request_id, file.as_deref())
                .await
        }
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Serve {
        host: Some(host_addr),
        port: Some(port_num),
        ..
    }) = &cli.command
        && *port_num < 1024
        && host_addr == "0.0.0.0"
    {
        eprintln!("Warning: Binding to 0.0.0.0 on port {port_num} requires root privileges");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MessagingConfig;
    use clap::Parser;

    fn valid_config() -> Settings {
        Settings {
            messaging: MessagingConfig {
                project_id: "school-app".to_string(),
                access_token: Some("ya29.test".to_string()),
                ..MessagingConfig::default()
            },
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_execute_serve_dry_run() {
        let cli = Cli::try_parse_from(["bulletin-rs", "serve", "--dry-run"]).unwrap();
        let result = execute_command(&cli, valid_config(), Environment::Test).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_execute_dispatch_with_missing_file() {
        let cli = Cli::try_parse_from([
            "bulletin-rs",
            "dispatch",
            "--request-id",
            "abc123",
            "--file",
            "/nonexistent/request.json",
        ])
        .unwrap();
        let err = execute_command(&cli, valid_config(), Environment::Test)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "cli_arguments"));
    }

    #[test]
    fn test_validate_command_args() {
        let cli = Cli::try_parse_from(["bulletin-rs", "serve", "--port", "8080"]).unwrap();
        assert!(validate_command_args(&cli).is_ok());
    }
}
