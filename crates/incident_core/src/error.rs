//! Error types for the incident core.

use thiserror::Error;

/// Result type alias for incident operations.
pub type IncidentResult<T> = Result<T, IncidentError>;

/// Errors that can occur during incident operations.
///
/// The `Display` text of the first two variants is written for chat users and
/// is returned verbatim as the command reply.
#[derive(Error, Debug)]
pub enum IncidentError {
    #[error(
        "There is already an ongoing incident in this channel (\"{title}\"). If you have two \
         ongoing incidents, invite me in to a different room to start an additional incident."
    )]
    AlreadyActive { title: String },

    #[error("There are no active incidents in this channel.")]
    NoActiveIncident,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Missing argument for `{command}`: {parameter}")]
    MissingArgument { command: String, parameter: String },

    #[error("No async runtime available to schedule reminders")]
    RuntimeUnavailable,

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl IncidentError {
    /// Whether this error is an expected, user-facing outcome of a command
    /// rather than a fault in the bot itself.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::AlreadyActive { .. }
                | Self::NoActiveIncident
                | Self::UnknownRole(_)
                | Self::MissingArgument { .. }
        )
    }
}
