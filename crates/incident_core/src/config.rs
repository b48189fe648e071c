//! Bot configuration.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IncidentError, IncidentResult};
use crate::types::Role;

/// Upper bound for the reminder interval and inactivity threshold (30 days).
pub const MAX_INTERVAL_SECS: u64 = 30 * 24 * 60 * 60;

/// Incident bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IncidentConfig {
    /// Roles that must be claimed during an incident
    pub roles: Vec<Role>,
    /// Seconds between reminder ticks
    pub nag_interval_secs: u64,
    /// Seconds without activity before an inactivity warning is sent
    pub inactivity_threshold_secs: u64,
    /// Prefix of the collaboration link; the slugged title is appended
    pub collaboration_link_base: String,
    /// Leading marker that turns a chat line into a command
    pub command_prefix: String,
}

impl Default for IncidentConfig {
    fn default() -> Self {
        Self {
            roles: Role::all(),
            nag_interval_secs: 60,
            inactivity_threshold_secs: 300, // 5 minutes
            collaboration_link_base: "g.co/hangout/example.com/incident-".to_string(),
            command_prefix: ".".to_string(),
        }
    }
}

impl IncidentConfig {
    pub fn roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn nag_interval(mut self, seconds: u64) -> Self {
        self.nag_interval_secs = seconds;
        self
    }

    pub fn inactivity_threshold(mut self, seconds: u64) -> Self {
        self.inactivity_threshold_secs = seconds;
        self
    }

    pub fn collaboration_link_base(mut self, base: impl Into<String>) -> Self {
        self.collaboration_link_base = base.into();
        self
    }

    pub fn command_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.command_prefix = prefix.into();
        self
    }

    /// Reminder period, capped at [`MAX_INTERVAL_SECS`].
    pub fn nag_period(&self) -> Duration {
        Duration::from_secs(self.nag_interval_secs.min(MAX_INTERVAL_SECS))
    }

    /// Inactivity threshold, capped at [`MAX_INTERVAL_SECS`].
    pub fn inactivity_threshold_duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.inactivity_threshold_secs.min(MAX_INTERVAL_SECS) as i64)
    }

    /// Load a TOML config file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> IncidentResult<Self> {
        let path = path.as_ref();
        debug!("Loading config from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        let config = config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> IncidentResult<Self> {
        let config = Self::default().apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `INCIDENTBOT_*` environment variables.
    pub fn apply_env(self) -> IncidentResult<Self> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> IncidentResult<Self> {
        if let Some(value) = var("INCIDENTBOT_NAG_INTERVAL_SECS") {
            self.nag_interval_secs = parse_secs("INCIDENTBOT_NAG_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = var("INCIDENTBOT_INACTIVITY_SECS") {
            self.inactivity_threshold_secs = parse_secs("INCIDENTBOT_INACTIVITY_SECS", &value)?;
        }
        if let Some(value) = var("INCIDENTBOT_LINK_BASE") {
            self.collaboration_link_base = value;
        }
        if let Some(value) = var("INCIDENTBOT_COMMAND_PREFIX") {
            self.command_prefix = value;
        }
        if let Some(value) = var("INCIDENTBOT_ROLES") {
            self.roles = value
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<IncidentResult<Vec<Role>>>()?;
        }
        Ok(self)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> IncidentResult<()> {
        if self.nag_interval_secs == 0 {
            return Err(IncidentError::Config(
                "nag_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.nag_interval_secs > MAX_INTERVAL_SECS {
            return Err(IncidentError::Config(format!(
                "nag_interval_secs must be at most {}",
                MAX_INTERVAL_SECS
            )));
        }
        if self.inactivity_threshold_secs > MAX_INTERVAL_SECS {
            return Err(IncidentError::Config(format!(
                "inactivity_threshold_secs must be at most {}",
                MAX_INTERVAL_SECS
            )));
        }
        if self.roles.is_empty() {
            return Err(IncidentError::Config("at least one role is required".to_string()));
        }
        let mut seen = HashSet::new();
        for role in &self.roles {
            if !seen.insert(role) {
                return Err(IncidentError::Config(format!("duplicate role: {}", role)));
            }
        }
        if self.command_prefix.trim().is_empty() {
            return Err(IncidentError::Config("command_prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

fn parse_secs(key: &str, value: &str) -> IncidentResult<u64> {
    value.trim().parse().map_err(|_| {
        IncidentError::Config(format!("{} must be a number of seconds, got {:?}", key, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = IncidentConfig::default();
        assert_eq!(config.nag_interval_secs, 60);
        assert_eq!(config.inactivity_threshold_secs, 300);
        assert_eq!(config.roles.len(), 4);
        assert_eq!(config.command_prefix, ".");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("incidentbot.toml");
        std::fs::write(
            &path,
            r#"
roles = ["commander", "operations"]
nag_interval_secs = 30
"#,
        )
        .unwrap();

        let config = IncidentConfig::load(&path).unwrap();
        assert_eq!(config.roles, vec![Role::Commander, Role::Operations]);
        assert_eq!(config.nag_interval_secs, 30);
        // Unset fields keep their defaults
        assert_eq!(config.inactivity_threshold_secs, 300);
    }

    #[test]
    fn test_load_rejects_unknown_role() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("incidentbot.toml");
        std::fs::write(&path, "roles = [\"janitor\"]\n").unwrap();

        assert!(matches!(IncidentConfig::load(&path), Err(IncidentError::Toml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("INCIDENTBOT_NAG_INTERVAL_SECS", "15"),
            ("INCIDENTBOT_ROLES", "planning, commander"),
            ("INCIDENTBOT_COMMAND_PREFIX", "!"),
        ]
        .into_iter()
        .collect();

        let config = IncidentConfig::default()
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.nag_interval_secs, 15);
        assert_eq!(config.roles, vec![Role::Planning, Role::Commander]);
        assert_eq!(config.command_prefix, "!");
    }

    #[test]
    fn test_env_override_bad_number() {
        let result = IncidentConfig::default().apply_vars(|key| {
            (key == "INCIDENTBOT_INACTIVITY_SECS").then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(IncidentError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(IncidentConfig::default().nag_interval(0).validate().is_err());
        assert!(IncidentConfig::default().roles(vec![]).validate().is_err());
        assert!(IncidentConfig::default()
            .roles(vec![Role::Commander, Role::Commander])
            .validate()
            .is_err());
        assert!(IncidentConfig::default().command_prefix(" ").validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_durations() {
        let config = IncidentConfig::default().inactivity_threshold(u64::MAX);
        assert!(matches!(config.validate(), Err(IncidentError::Config(_))));
        let config = IncidentConfig::default().inactivity_threshold(100_000_000_000_000_000);
        assert!(matches!(config.validate(), Err(IncidentError::Config(_))));
        let config = IncidentConfig::default().nag_interval(u64::MAX);
        assert!(matches!(config.validate(), Err(IncidentError::Config(_))));

        let config = IncidentConfig::default()
            .nag_interval(MAX_INTERVAL_SECS)
            .inactivity_threshold(MAX_INTERVAL_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_oversized_durations_saturate() {
        // Unvalidated configs still convert without wrapping or panicking
        let config = IncidentConfig::default()
            .nag_interval(u64::MAX)
            .inactivity_threshold(u64::MAX);
        assert_eq!(config.nag_period(), Duration::from_secs(MAX_INTERVAL_SECS));
        let threshold = config.inactivity_threshold_duration();
        assert!(threshold > chrono::Duration::zero());
        assert_eq!(threshold.num_seconds(), MAX_INTERVAL_SECS as i64);
    }

    #[test]
    fn test_env_oversized_interval_rejected() {
        let result = IncidentConfig::default()
            .apply_vars(|key| {
                (key == "INCIDENTBOT_INACTIVITY_SECS").then(|| u64::MAX.to_string())
            })
            .and_then(|config| config.validate());
        assert!(matches!(result, Err(IncidentError::Config(_))));
    }
}
