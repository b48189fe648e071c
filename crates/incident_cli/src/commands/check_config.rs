//! Check-config command - Validate configuration.

use anyhow::{Context, Result};
use clap::Args;
use incident_core::IncidentConfig;

#[derive(Args)]
pub struct CheckConfigArgs {
    /// Print the effective config as JSON
    #[arg(long)]
    json: bool,
}

pub fn execute(args: CheckConfigArgs, config: &IncidentConfig) -> Result<()> {
    if args.json {
        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        println!("{}", json);
        return Ok(());
    }

    println!("✅ Configuration is valid");
    println!("   Reminder interval:    {}s", config.nag_interval_secs);
    println!("   Inactivity threshold: {}s", config.inactivity_threshold_secs);
    println!("   Command prefix:       {}", config.command_prefix);
    println!("   Collaboration link:   {}<title>", config.collaboration_link_base);
    let roles: Vec<&str> = config.roles.iter().map(|r| r.as_str()).collect();
    println!("   Roles:                {}", roles.join(", "));
    Ok(())
}
