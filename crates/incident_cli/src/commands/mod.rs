//! CLI command definitions.
//!
//! This module defines the command structure for the incidentbot CLI.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use incident_core::IncidentConfig;

pub mod check_config;
pub mod console;
pub mod help;

/// incidentbot - chat incident coordinator
#[derive(Parser)]
#[command(name = "incidentbot")]
#[command(version, about = "incidentbot - coordinate incidents from a chat channel")]
#[command(long_about = r#"
incidentbot tracks incidents inside chat channels: it records the channel
history while an incident is open, reminds responders to claim roles, warns
when a channel goes quiet and uploads the incident log on resolve.

COMMANDS:
  console       → Run the bot against a console channel (stdin/stdout)
  help-commands → Print the chat commands the bot understands
  check-config  → Validate a config file and print the effective settings

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments or configuration
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "INCIDENTBOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot against a console channel
    Console(console::ConsoleArgs),

    /// Print the chat commands the bot understands
    #[command(name = "help-commands")]
    HelpCommands,

    /// Validate configuration and print the effective settings
    #[command(name = "check-config")]
    CheckConfig(check_config::CheckConfigArgs),
}

/// Load the config file if one was given, otherwise defaults; environment
/// overrides apply either way.
pub fn load_config(path: Option<&PathBuf>) -> incident_core::IncidentResult<IncidentConfig> {
    match path {
        Some(path) => IncidentConfig::load(path),
        None => IncidentConfig::from_env(),
    }
}
