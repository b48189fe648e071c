//! Incident registry: the channel → incident map and its lifecycle operations.
//!
//! Locking: the map lock is always taken before an incident lock, and reminder
//! ticks only ever take the incident lock. `start` checks and inserts under
//! one map lock; `resolve` closes the incident (cancelling its reminders) and
//! removes it under the same map lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::config::IncidentConfig;
use crate::error::{IncidentError, IncidentResult};
use crate::gateway::MessagingGateway;
use crate::history::{self, ExportDocument};
use crate::incident::{Incident, IncidentId};
use crate::nag::{NagScheduler, NagSettings};
use crate::status::{self, StatusReport};
use crate::time::{format_duration, format_timestamp};
use crate::types::{ChannelId, ChannelRef, Identity, Role};

type SharedIncident = Arc<Mutex<Incident>>;

/// Returned by a successful `start`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StartConfirmation {
    #[serde(rename = "incidentId")]
    pub incident_id: IncidentId,
    pub title: String,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    #[serde(rename = "collaborationLink")]
    pub collaboration_link: String,
}

impl fmt::Display for StartConfirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Starting new incident \"{}\" at {} UTC\nJoin this call to collaborate: {}",
            self.title,
            format_timestamp(self.started_at),
            self.collaboration_link
        )
    }
}

/// Returned by a successful `resolve`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub title: String,
    #[serde(skip)]
    pub duration: Duration,
    /// Same duration, formatted
    #[serde(rename = "duration")]
    pub duration_text: String,
    /// Number of history lines in the exported log
    #[serde(rename = "historyEntries")]
    pub history_entries: usize,
}

impl fmt::Display for ResolutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Resolving incident \"{}\". Incident lasted {}.",
            self.title, self.duration_text
        )
    }
}

/// Returned by a successful role assignment.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoleAssignment {
    pub role: Role,
    pub assignee: String,
    pub title: String,
}

impl fmt::Display for RoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is now assigned as {} for this incident.",
            self.assignee,
            self.role.label().to_lowercase()
        )
    }
}

/// Owns every active incident.
pub struct IncidentRegistry {
    config: IncidentConfig,
    gateway: Arc<dyn MessagingGateway>,
    scheduler: NagScheduler,
    incidents: Mutex<HashMap<ChannelId, SharedIncident>>,
}

impl IncidentRegistry {
    /// Create a registry whose reminder tasks run on the current Tokio runtime.
    pub fn new(config: IncidentConfig, gateway: Arc<dyn MessagingGateway>) -> IncidentResult<Self> {
        let runtime = Handle::try_current().map_err(|_| IncidentError::RuntimeUnavailable)?;
        Self::with_runtime(config, gateway, runtime)
    }

    /// Create a registry whose reminder tasks run on `runtime`.
    pub fn with_runtime(
        config: IncidentConfig,
        gateway: Arc<dyn MessagingGateway>,
        runtime: Handle,
    ) -> IncidentResult<Self> {
        config.validate()?;
        let scheduler =
            NagScheduler::new(runtime, Arc::clone(&gateway), NagSettings::from(&config));
        Ok(Self {
            config,
            gateway,
            scheduler,
            incidents: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &IncidentConfig {
        &self.config
    }

    /// Start an incident in `channel`. Fails if one is already running there.
    pub fn start(
        &self,
        channel: &ChannelRef,
        reporter: &Identity,
        title: &str,
    ) -> IncidentResult<StartConfirmation> {
        let title = title.trim();
        if title.is_empty() {
            return Err(IncidentError::MissingArgument {
                command: "start".to_string(),
                parameter: "TITLE".to_string(),
            });
        }

        let mut incidents = self.incidents.lock();
        if let Some(existing) = incidents.get(&channel.id) {
            return Err(IncidentError::AlreadyActive {
                title: existing.lock().title().to_string(),
            });
        }

        let incident = Incident::new(
            channel.clone(),
            reporter.clone(),
            title,
            &self.config.roles,
            &self.config.collaboration_link_base,
            Utc::now(),
        );
        let confirmation = StartConfirmation {
            incident_id: incident.id(),
            title: incident.title().to_string(),
            started_at: incident.started_at(),
            collaboration_link: incident.collaboration_link().to_string(),
        };

        let shared = Arc::new(Mutex::new(incident));
        let handle = self.scheduler.schedule(&shared);
        shared.lock().attach_nag(handle);
        incidents.insert(channel.id.clone(), shared);

        info!(
            "Started incident {} \"{}\" in {} (reported by {})",
            confirmation.incident_id, confirmation.title, channel.id, reporter.name
        );
        Ok(confirmation)
    }

    /// Resolve the incident in `channel_id`: cancel its reminders, upload its
    /// log and forget it.
    pub fn resolve(&self, channel_id: &str) -> IncidentResult<ResolutionSummary> {
        let (summary, document) = {
            let mut incidents = self.incidents.lock();
            let shared = incidents
                .get(channel_id)
                .cloned()
                .ok_or(IncidentError::NoActiveIncident)?;
            let mut incident = shared.lock();

            let now = Utc::now();
            let duration = incident.elapsed(now);
            incident.close();
            let document = history::export(&incident, now);
            incidents.remove(channel_id);

            info!(
                "Resolved incident {} \"{}\" after {}",
                incident.id(),
                incident.title(),
                format_duration(duration)
            );
            let summary = ResolutionSummary {
                title: incident.title().to_string(),
                duration,
                duration_text: format_duration(duration),
                history_entries: document.entries,
            };
            (summary, document)
        };

        history::upload(self.gateway.as_ref(), document);
        Ok(summary)
    }

    /// Give `role` to `assignee` in the incident running in `channel_id`.
    pub fn assign_role(
        &self,
        channel_id: &str,
        role: Role,
        assignee: &Identity,
    ) -> IncidentResult<RoleAssignment> {
        let shared = self.get(channel_id)?;
        let mut incident = shared.lock();
        if incident.is_closed() {
            return Err(IncidentError::NoActiveIncident);
        }

        incident.assign(role, assignee.display_name.clone())?;
        info!(
            "{} assigned as {} for incident {}",
            assignee.display_name,
            role,
            incident.id()
        );
        Ok(RoleAssignment {
            role,
            assignee: assignee.display_name.clone(),
            title: incident.title().to_string(),
        })
    }

    /// Upload the current log of an incident without resolving it.
    pub fn history(&self, channel_id: &str) -> IncidentResult<ExportDocument> {
        let document = {
            let shared = self.get(channel_id)?;
            let incident = shared.lock();
            if incident.is_closed() {
                return Err(IncidentError::NoActiveIncident);
            }
            history::export(&incident, Utc::now())
        };

        history::upload(self.gateway.as_ref(), document.clone());
        Ok(document)
    }

    /// Summaries of every active incident.
    pub fn status(&self) -> StatusReport {
        let now = Utc::now();
        let summaries = self
            .shared_incidents()
            .iter()
            .filter_map(|shared| {
                let incident = shared.lock();
                (!incident.is_closed()).then(|| status::summarize(&incident, now))
            })
            .collect();
        status::render(summaries)
    }

    /// Catch-all hook for every chat message. Records it when an incident is
    /// active in the channel and returns whether it was recorded.
    pub fn observe_message(&self, channel_id: &str, author: &Identity, text: &str) -> bool {
        let Ok(shared) = self.get(channel_id) else {
            return false;
        };
        let mut incident = shared.lock();
        if incident.is_closed() {
            return false;
        }
        incident.record_message(author.name.clone(), text, Utc::now());
        true
    }

    pub fn is_active(&self, channel_id: &str) -> bool {
        self.incidents.lock().contains_key(channel_id)
    }

    pub fn len(&self) -> usize {
        self.incidents.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.lock().is_empty()
    }

    /// Run `f` against the incident in `channel_id`, if any.
    pub fn with_incident<R>(&self, channel_id: &str, f: impl FnOnce(&Incident) -> R) -> Option<R> {
        let shared = self.get(channel_id).ok()?;
        let incident = shared.lock();
        Some(f(&*incident))
    }

    /// Cancel every reminder task and drop all incidents. Returns how many
    /// incidents were dropped.
    pub fn shutdown(&self) -> usize {
        let mut incidents = self.incidents.lock();
        let count = incidents.len();
        for (channel_id, shared) in incidents.drain() {
            shared.lock().close();
            debug!("Dropped incident in {} during shutdown", channel_id);
        }
        if count > 0 {
            info!("Shut down incident registry, dropped {} active incidents", count);
        }
        count
    }

    fn get(&self, channel_id: &str) -> IncidentResult<SharedIncident> {
        self.incidents
            .lock()
            .get(channel_id)
            .cloned()
            .ok_or(IncidentError::NoActiveIncident)
    }

    fn shared_incidents(&self) -> Vec<SharedIncident> {
        self.incidents.lock().values().cloned().collect()
    }
}

impl Drop for IncidentRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for IncidentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncidentRegistry")
            .field("config", &self.config)
            .field("incidents", &self.incidents.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}
