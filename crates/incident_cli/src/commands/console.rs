//! Console command - Run the bot against stdin/stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use incident_core::{ChannelRef, CommandTable, Identity, IncidentConfig, IncidentRegistry, Reply};

use crate::gateway::ConsoleGateway;
use crate::input::{parse_line, ConsoleLine};

#[derive(Args)]
pub struct ConsoleArgs {
    /// Channel id to start in
    #[arg(long, default_value = "C000CONSOLE")]
    channel: String,

    /// Channel display name
    #[arg(long, default_value = "incidents")]
    channel_name: String,

    /// Treat the starting channel as a private chat
    #[arg(long)]
    private: bool,

    /// User handle to speak as
    #[arg(short, long, env = "USER", default_value = "operator")]
    user: String,

    /// Display name for the user (defaults to the handle)
    #[arg(long)]
    display_name: Option<String>,

    /// Contact email for the user
    #[arg(long)]
    email: Option<String>,

    /// Directory uploaded incident logs are written to
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Print command replies as JSON
    #[arg(long)]
    json: bool,
}

struct Session {
    sender: Identity,
    channel: ChannelRef,
}

impl Session {
    fn prompt(&self) -> String {
        format!("[{}] {}", self.channel.display_name(), self.sender.name)
    }
}

pub async fn execute(args: ConsoleArgs, config: IncidentConfig) -> Result<()> {
    let gateway = Arc::new(ConsoleGateway::new(&args.export_dir));
    let registry = IncidentRegistry::new(config.clone(), gateway)
        .context("Failed to create incident registry")?;
    let commands = CommandTable::standard(&config);

    let mut sender = Identity::new(
        args.user.clone(),
        args.display_name.clone().unwrap_or_else(|| args.user.clone()),
    );
    if let Some(email) = &args.email {
        sender = sender.email(email.clone());
    }
    let channel = if args.private {
        ChannelRef::private(args.channel.clone())
    } else {
        ChannelRef::new(args.channel.clone(), args.channel_name.clone())
    };
    let mut session = Session { sender, channel };

    info!(
        "Console started in {} as {}; logs go to {:?}",
        session.channel.display_name(),
        session.sender.name,
        args.export_dir
    );
    println!(
        "incidentbot console - type `{}help` for commands, /quit to leave",
        commands.prefix()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let parsed = match parse_line(&line) {
            Ok(parsed) => parsed,
            Err(e) => {
                eprintln!("⚠️  {}", e);
                continue;
            }
        };

        match parsed {
            ConsoleLine::Blank => {}
            ConsoleLine::Quit => break,
            ConsoleLine::SwitchUser(name) => {
                session.sender = Identity::named(name);
                println!("now speaking as {}", session.prompt());
            }
            ConsoleLine::Join(name) => {
                session.channel = ChannelRef::new(format!("C-{}", name), name);
                println!("joined {}", session.prompt());
            }
            ConsoleLine::DirectMessage(id) => {
                session.channel = ChannelRef::private(id);
                println!("joined {}", session.prompt());
            }
            ConsoleLine::Chat(text) => {
                if let Some(reply) =
                    commands.handle_message(&registry, &text, &session.sender, &session.channel)
                {
                    print_reply(&session.channel, &reply, args.json)?;
                }
            }
        }
    }

    let dropped = registry.shutdown();
    if dropped > 0 {
        warn!("Exiting with {} unresolved incidents; their logs were not exported", dropped);
    }
    Ok(())
}

fn print_reply(channel: &ChannelRef, reply: &Reply, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(reply).context("Failed to serialize reply")?);
    } else {
        for line in reply.text().lines() {
            println!("[{}] bot: {}", channel.id, line);
        }
    }
    Ok(())
}
