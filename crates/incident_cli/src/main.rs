//! incidentbot CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments or configuration

use std::process::ExitCode;

use clap::Parser;
use incident_core::IncidentError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod gateway;
mod input;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "incident_cli={level},incident_core={level},warn",
            level = default_level
        ))
    });
    // Logs go to stderr; stdout is the chat channel
    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("❌ Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = commands::load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Console(args) => commands::console::execute(args, config).await,
        Commands::HelpCommands => commands::help::execute(&config),
        Commands::CheckConfig(args) => commands::check_config::execute(args, &config),
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<IncidentError>() {
        Some(IncidentError::Config(_) | IncidentError::Toml(_) | IncidentError::UnknownRole(_)) => {
            ExitCodes::INVALID_ARGS
        }
        Some(IncidentError::Io(io)) if io.kind() == std::io::ErrorKind::NotFound => {
            ExitCodes::INVALID_ARGS
        }
        _ => ExitCodes::GENERAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_invalid_args() {
        let err = anyhow::Error::new(IncidentError::Config("bad".to_string()));
        assert_eq!(categorize_error(&err), ExitCodes::INVALID_ARGS);
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("boom");
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
        let err = anyhow::Error::new(IncidentError::RuntimeUnavailable);
        assert_eq!(categorize_error(&err), ExitCodes::GENERAL_ERROR);
    }

    #[test]
    fn test_cli_parses_console_args() {
        let cli = Cli::try_parse_from([
            "incidentbot",
            "console",
            "--channel",
            "C42",
            "--user",
            "alice",
            "--json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Console(_)));
        assert!(!cli.verbose);
    }
}
