//! Core types shared across the incident modules.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IncidentError;

/// Chat channel identifier, the identity key of an incident.
pub type ChannelId = String;

/// Display name used for channels that have no name of their own.
pub const PRIVATE_CHANNEL_NAME: &str = "Private Message";

/// The chat user who sent a message or command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    /// Account handle
    pub name: String,
    /// Human readable name
    #[serde(rename = "displayName")]
    pub display_name: String,
    /// Contact email, if the platform exposes one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: display_name.into(),
            email: None,
        }
    }

    /// Identity known only by a free-text name, e.g. a `.commander Bob` argument.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone(), name)
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// The channel a message or command arrived in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: ChannelId,
    /// `None` for private/direct chats
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
        }
    }

    /// A direct-message channel without a display name.
    pub fn private(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    /// Channel name, or the private-chat placeholder.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(PRIVATE_CHANNEL_NAME)
    }
}

/// Responder roles that can be claimed during an incident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Commander,
    Communications,
    Planning,
    Operations,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Commander => "commander",
            Role::Communications => "communications",
            Role::Planning => "planning",
            Role::Operations => "operations",
        }
    }

    /// Title-cased label used in rendered summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Commander => "Commander",
            Role::Communications => "Communications",
            Role::Planning => "Planning",
            Role::Operations => "Operations",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Commander => "Coordinates the response and makes the final calls",
            Role::Communications => "Keeps stakeholders and customers informed",
            Role::Planning => "Tracks follow-ups, timeline and post-incident actions",
            Role::Operations => "Hands-on investigation and remediation",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![
            Role::Commander,
            Role::Communications,
            Role::Planning,
            Role::Operations,
        ]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IncidentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "commander" => Ok(Role::Commander),
            "communications" => Ok(Role::Communications),
            "planning" => Ok(Role::Planning),
            "operations" => Ok(Role::Operations),
            other => Err(IncidentError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in Role::all() {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("  Commander ".parse::<Role>().unwrap(), Role::Commander);
    }

    #[test]
    fn test_role_parse_unknown() {
        let err = "janitor".parse::<Role>().unwrap_err();
        assert!(matches!(err, IncidentError::UnknownRole(ref r) if r == "janitor"));
    }

    #[test]
    fn test_private_channel_placeholder() {
        assert_eq!(ChannelRef::private("D1").display_name(), "Private Message");
        assert_eq!(ChannelRef::new("C1", "ops").display_name(), "ops");
    }

    #[test]
    fn test_identity_named() {
        let who = Identity::named("Bob");
        assert_eq!(who.name, "Bob");
        assert_eq!(who.display_name, "Bob");
        assert!(who.email.is_none());
    }
}
