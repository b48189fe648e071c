//! Chat command table.
//!
//! The table is built once at startup and maps each command name to the
//! registry operation it runs plus the parameters it takes. A dispatcher
//! feeds it every chat line through [`CommandTable::handle_message`].

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::IncidentConfig;
use crate::error::{IncidentError, IncidentResult};
use crate::registry::IncidentRegistry;
use crate::status::StatusReport;
use crate::types::{ChannelRef, Identity, Role};

/// Parameters a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamContract {
    None,
    Required(&'static str),
    Optional(&'static str),
}

impl ParamContract {
    fn usage(&self) -> String {
        match self {
            Self::None => String::new(),
            Self::Required(name) => format!(" <{}>", name),
            Self::Optional(name) => format!(" [{}]", name),
        }
    }
}

/// Registry operation behind a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Start,
    Resolve,
    Status,
    History,
    Assign(Role),
    Help,
}

/// One entry in the command table.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub params: ParamContract,
    pub summary: String,
    pub action: CommandAction,
}

/// A parsed command invocation.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub command: &'a str,
    pub params: Vec<&'a str>,
    pub sender: &'a Identity,
    pub channel: &'a ChannelRef,
}

/// What a command sends back to the channel.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum Reply {
    Text(String),
    Status(StatusReport),
}

impl Reply {
    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Status(report) => write!(f, "{}", report),
        }
    }
}

/// Builder for a [`CommandTable`].
#[derive(Debug)]
pub struct CommandTableBuilder {
    prefix: String,
    commands: Vec<CommandSpec>,
}

impl CommandTableBuilder {
    /// Register a command. A later registration under the same name replaces
    /// the earlier one.
    pub fn command(
        mut self,
        name: impl Into<String>,
        params: ParamContract,
        summary: impl Into<String>,
        action: CommandAction,
    ) -> Self {
        let spec = CommandSpec {
            name: name.into().to_lowercase(),
            params,
            summary: summary.into(),
            action,
        };
        debug!("Registering command: {}", spec.name);
        match self.commands.iter_mut().find(|c| c.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.commands.push(spec),
        }
        self
    }

    pub fn build(self) -> CommandTable {
        CommandTable {
            prefix: self.prefix,
            commands: self.commands,
        }
    }
}

/// Maps command names to registry operations.
#[derive(Debug, Clone)]
pub struct CommandTable {
    prefix: String,
    commands: Vec<CommandSpec>,
}

impl CommandTable {
    pub fn builder(prefix: impl Into<String>) -> CommandTableBuilder {
        CommandTableBuilder {
            prefix: prefix.into(),
            commands: Vec::new(),
        }
    }

    /// The bot's command set: start, resolve, history, one claim command per
    /// configured role, status and help.
    pub fn standard(config: &IncidentConfig) -> Self {
        let mut builder = Self::builder(config.command_prefix.clone())
            .command(
                "start",
                ParamContract::Required("TITLE"),
                "Start logging a new incident.",
                CommandAction::Start,
            )
            .command(
                "resolve",
                ParamContract::None,
                "Resolve an ongoing incident and see the chat log since it started.",
                CommandAction::Resolve,
            )
            .command(
                "history",
                ParamContract::None,
                "View a log in snippet format since the incident started.",
                CommandAction::History,
            );
        for role in &config.roles {
            builder = builder.command(
                role.as_str(),
                ParamContract::Optional("NAME"),
                format!(
                    "Assign yourself (or NAME) as {} of the ongoing incident. {}.",
                    role.label().to_lowercase(),
                    role.description()
                ),
                CommandAction::Assign(*role),
            );
        }
        builder
            .command(
                "status",
                ParamContract::None,
                "View ongoing incidents.",
                CommandAction::Status,
            )
            .command(
                "help",
                ParamContract::None,
                "Show this help.",
                CommandAction::Help,
            )
            .build()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn get(&self, name: &str) -> Option<&CommandSpec> {
        let name = name.to_lowercase();
        self.commands.iter().find(|c| c.name == name)
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// Split a chat line into command name and parameter tokens. Returns
    /// `None` for lines that are not commands.
    pub fn parse<'a>(&self, line: &'a str) -> Option<(&'a str, Vec<&'a str>)> {
        let rest = line.trim_start().strip_prefix(self.prefix.as_str())?;
        let mut tokens = rest.split_whitespace();
        let name = tokens.next()?;
        Some((name, tokens.collect()))
    }

    /// Usage text generated from the table.
    pub fn help(&self) -> String {
        let mut text = String::from("Use the following commands:");
        for spec in &self.commands {
            text.push_str(&format!(
                "\n> `{}{}{}` - {}",
                self.prefix,
                spec.name,
                spec.params.usage(),
                spec.summary
            ));
        }
        text
    }

    /// Run an invocation. Returns `None` when the command is not in the table.
    pub fn execute(
        &self,
        registry: &IncidentRegistry,
        invocation: &Invocation<'_>,
    ) -> Option<IncidentResult<Reply>> {
        let spec = self.get(invocation.command)?;
        let argument = invocation.params.join(" ");

        if let ParamContract::Required(parameter) = spec.params {
            if argument.trim().is_empty() {
                return Some(Err(IncidentError::MissingArgument {
                    command: format!("{}{}", self.prefix, spec.name),
                    parameter: parameter.to_string(),
                }));
            }
        }

        let channel_id = invocation.channel.id.as_str();
        let result = match spec.action {
            CommandAction::Start => registry
                .start(invocation.channel, invocation.sender, &argument)
                .map(|c| Reply::Text(c.to_string())),
            CommandAction::Resolve => registry
                .resolve(channel_id)
                .map(|s| Reply::Text(s.to_string())),
            CommandAction::History => registry.history(channel_id).map(|doc| {
                Reply::Text(format!(
                    "Uploaded \"{}\" ({} messages so far).",
                    doc.title, doc.entries
                ))
            }),
            CommandAction::Assign(role) => {
                let assignee = if argument.trim().is_empty() {
                    invocation.sender.clone()
                } else {
                    Identity::named(argument.trim())
                };
                registry
                    .assign_role(channel_id, role, &assignee)
                    .map(|a| Reply::Text(a.to_string()))
            }
            CommandAction::Status => Ok(Reply::Status(registry.status())),
            CommandAction::Help => Ok(Reply::Text(self.help())),
        };
        Some(result)
    }

    /// Like [`execute`](Self::execute), but every error becomes a text reply.
    pub fn dispatch(
        &self,
        registry: &IncidentRegistry,
        invocation: &Invocation<'_>,
    ) -> Option<Reply> {
        self.execute(registry, invocation).map(|result| {
            result.unwrap_or_else(|e| {
                if !e.is_user_facing() {
                    warn!("Command {} failed: {}", invocation.command, e);
                }
                Reply::Text(e.to_string())
            })
        })
    }

    /// Entry point for every chat message: records it in the channel's
    /// incident history, then runs it if it is a known command.
    pub fn handle_message(
        &self,
        registry: &IncidentRegistry,
        text: &str,
        sender: &Identity,
        channel: &ChannelRef,
    ) -> Option<Reply> {
        registry.observe_message(&channel.id, sender, text);

        let (command, params) = self.parse(text)?;
        let invocation = Invocation {
            command,
            params,
            sender,
            channel,
        };
        self.dispatch(registry, &invocation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockGateway;
    use std::sync::Arc;

    fn setup() -> (CommandTable, IncidentRegistry, MockGateway) {
        let config = IncidentConfig::default();
        let gateway = MockGateway::new();
        let registry = IncidentRegistry::new(config.clone(), Arc::new(gateway.clone())).unwrap();
        (CommandTable::standard(&config), registry, gateway)
    }

    #[test]
    fn test_standard_table_has_role_commands() {
        let table = CommandTable::standard(&IncidentConfig::default());
        for name in ["start", "resolve", "history", "status", "help"] {
            assert!(table.get(name).is_some(), "missing {}", name);
        }
        for role in Role::all() {
            assert_eq!(table.get(role.as_str()).unwrap().action, CommandAction::Assign(role));
        }
        assert!(table.get("point").is_none());
    }

    #[test]
    fn test_builder_replaces_duplicates() {
        let table = CommandTable::builder("!")
            .command("help", ParamContract::None, "old", CommandAction::Help)
            .command("HELP", ParamContract::None, "new", CommandAction::Help)
            .build();
        assert_eq!(table.commands().len(), 1);
        assert_eq!(table.get("help").unwrap().summary, "new");
    }

    #[test]
    fn test_parse() {
        let table = CommandTable::standard(&IncidentConfig::default());
        assert_eq!(table.parse(".start DB  outage"), Some(("start", vec!["DB", "outage"])));
        assert_eq!(table.parse("  .status"), Some(("status", vec![])));
        assert_eq!(table.parse("just chatting"), None);
        assert_eq!(table.parse("."), None);
    }

    #[test]
    fn test_help_lists_every_command() {
        let table = CommandTable::standard(&IncidentConfig::default());
        let help = table.help();
        assert!(help.starts_with("Use the following commands:"));
        assert!(help.contains("> `.start <TITLE>` - Start logging a new incident."));
        assert!(help.contains("> `.commander [NAME]` - "));
        assert_eq!(help.lines().count(), 1 + table.commands().len());
    }

    #[tokio::test]
    async fn test_handle_message_flow() {
        let (table, registry, gateway) = setup();
        let channel = ChannelRef::new("C1", "ops");
        let alice = Identity::new("alice", "Alice");
        let bob = Identity::new("bob", "Bob");

        assert_eq!(table.handle_message(&registry, "hello", &alice, &channel), None);

        let reply = table
            .handle_message(&registry, ".start DB outage", &alice, &channel)
            .unwrap();
        assert!(reply.text().contains("\"DB outage\""));

        assert_eq!(table.handle_message(&registry, "checking replicas", &bob, &channel), None);

        let reply = table.handle_message(&registry, ".commander", &bob, &channel).unwrap();
        assert_eq!(reply.text(), "Bob is now assigned as commander for this incident.");

        let reply = table
            .handle_message(&registry, ".operations Carol Danvers", &bob, &channel)
            .unwrap();
        assert_eq!(reply.text(), "Carol Danvers is now assigned as operations for this incident.");

        let reply = table.handle_message(&registry, ".status", &bob, &channel).unwrap();
        match reply {
            Reply::Status(report) => assert_eq!(report.active_count(), 1),
            other => panic!("expected status, got {:?}", other),
        }

        let reply = table.handle_message(&registry, ".resolve", &alice, &channel).unwrap();
        assert!(reply.text().starts_with("Resolving incident \"DB outage\""));

        let uploads = gateway.uploads();
        assert_eq!(uploads.len(), 1);
        let log = &uploads[0].upload.content;
        assert!(log.contains("bob: checking replicas"));
        assert!(log.contains("bob: .commander"));
        assert!(log.contains("alice: .resolve"));
        assert!(!log.contains("hello"));
    }

    #[tokio::test]
    async fn test_errors_become_replies() {
        let (table, registry, _) = setup();
        let channel = ChannelRef::new("C1", "ops");
        let alice = Identity::new("alice", "Alice");

        let reply = table.handle_message(&registry, ".resolve", &alice, &channel).unwrap();
        assert_eq!(reply.text(), "There are no active incidents in this channel.");

        let reply = table.handle_message(&registry, ".start", &alice, &channel).unwrap();
        assert_eq!(reply.text(), "Missing argument for `.start`: TITLE");

        table.handle_message(&registry, ".start one", &alice, &channel);
        let reply = table.handle_message(&registry, ".start two", &alice, &channel).unwrap();
        assert!(reply.text().starts_with("There is already an ongoing incident"));

        assert_eq!(table.handle_message(&registry, ".unknown", &alice, &channel), None);
    }

    #[tokio::test]
    async fn test_status_with_no_incidents() {
        let (table, registry, _) = setup();
        let reply = table
            .handle_message(&registry, ".status", &Identity::named("a"), &ChannelRef::private("D1"))
            .unwrap();
        assert_eq!(reply, Reply::Status(StatusReport::NoActiveIncidents));
        assert_eq!(reply.text(), "There are no active incidents!");
    }
}
