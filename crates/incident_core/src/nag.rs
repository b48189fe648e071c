//! Periodic reminders for active incidents.
//!
//! Every incident owns one background task that wakes on a fixed interval and
//! checks two things:
//! 1. Unclaimed roles: posts a reminder naming each one and how to claim it.
//! 2. Inactivity: if nothing happened for the configured threshold, posts a
//!    warning and resets the incident's activity clock so the warning is not
//!    repeated on every tick.
//!
//! Ticks take the incident's lock for their whole duration, so they never
//! interleave with command-driven mutations of the same incident.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::config::IncidentConfig;
use crate::gateway::{deliver_message, MessagingGateway};
use crate::incident::{Incident, IncidentId};
use crate::time::format_duration;
use crate::types::Role;

/// Cancel handle for an incident's reminder task.
///
/// Cancelling is idempotent; dropping the handle cancels the task too.
#[derive(Debug)]
pub struct NagHandle {
    incident_id: IncidentId,
    task: Option<JoinHandle<()>>,
}

impl NagHandle {
    pub fn incident_id(&self) -> IncidentId {
        self.incident_id
    }

    /// Stop the task. Returns `true` only for the call that actually stopped it.
    pub fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(task) => {
                task.abort();
                debug!("Cancelled reminders for incident {}", self.incident_id);
                true
            }
            None => false,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for NagHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Tick parameters taken from the config.
#[derive(Debug, Clone)]
pub struct NagSettings {
    pub period: Duration,
    pub inactivity_threshold: chrono::Duration,
    pub command_prefix: String,
}

impl From<&IncidentConfig> for NagSettings {
    fn from(config: &IncidentConfig) -> Self {
        Self {
            period: config.nag_period(),
            inactivity_threshold: config.inactivity_threshold_duration(),
            command_prefix: config.command_prefix.clone(),
        }
    }
}

/// What a single tick sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Roles listed in the reminder, empty if no reminder was sent
    pub missing_roles: Vec<Role>,
    pub inactivity_warning: bool,
}

impl TickOutcome {
    pub fn reminded(&self) -> bool {
        !self.missing_roles.is_empty()
    }

    pub fn is_quiet(&self) -> bool {
        !self.reminded() && !self.inactivity_warning
    }
}

pub fn reminder_text(missing: &[Role], prefix: &str) -> String {
    let mut text = String::from("The following roles have not been assigned yet:");
    for role in missing {
        text.push_str(&format!(
            "\n> *{}* - use `{}{}` to claim it",
            role.label(),
            prefix,
            role.as_str()
        ));
    }
    text
}

pub fn inactivity_text(threshold: chrono::Duration, prefix: &str) -> String {
    format!(
        "There hasn't been any activity in this channel for at least {} - is the incident \
         still ongoing? If not please `{}resolve` the incident.",
        format_duration(threshold),
        prefix
    )
}

/// Run one reminder tick against an incident.
pub fn run_tick(
    incident: &mut Incident,
    now: DateTime<Utc>,
    settings: &NagSettings,
    gateway: &dyn MessagingGateway,
) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    let channel_id = incident.channel_id().to_string();

    let missing = incident.roles().missing();
    if !missing.is_empty() {
        deliver_message(gateway, &channel_id, &reminder_text(&missing, &settings.command_prefix));
        outcome.missing_roles = missing;
    }

    if incident.idle(now) >= settings.inactivity_threshold {
        // Resetting the clock is what keeps the warning from firing every tick.
        incident.touch(now);
        deliver_message(
            gateway,
            &channel_id,
            &inactivity_text(settings.inactivity_threshold, &settings.command_prefix),
        );
        outcome.inactivity_warning = true;
    }

    debug!(
        "Reminder tick for incident {}: {} missing roles, inactivity warning: {}",
        incident.id(),
        outcome.missing_roles.len(),
        outcome.inactivity_warning
    );
    outcome
}

/// Spawns and owns the timing of per-incident reminder tasks.
#[derive(Clone)]
pub struct NagScheduler {
    runtime: Handle,
    gateway: Arc<dyn MessagingGateway>,
    settings: NagSettings,
}

impl NagScheduler {
    pub fn new(runtime: Handle, gateway: Arc<dyn MessagingGateway>, settings: NagSettings) -> Self {
        Self {
            runtime,
            gateway,
            settings,
        }
    }

    pub fn settings(&self) -> &NagSettings {
        &self.settings
    }

    /// Start the reminder task for an incident. The first tick fires one full
    /// period after scheduling.
    ///
    /// The task only holds a weak reference, so it also stops on its own once
    /// the incident is dropped.
    pub fn schedule(&self, incident: &Arc<Mutex<Incident>>) -> NagHandle {
        let incident_id = incident.lock().id();
        let weak = Arc::downgrade(incident);
        let gateway = Arc::clone(&self.gateway);
        let settings = self.settings.clone();
        let period = settings.period;

        let task = self.runtime.spawn(async move {
            let Some(start) = Instant::now().checked_add(period) else {
                warn!(
                    "Reminder period {:?} for incident {} is out of range",
                    period, incident_id
                );
                return;
            };
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !tick_once(&weak, &settings, gateway.as_ref()) {
                    break;
                }
            }
            debug!("Reminder task for incident {} finished", incident_id);
        });

        debug!(
            "Scheduled reminders for incident {} every {:?}",
            incident_id, period
        );
        NagHandle {
            incident_id,
            task: Some(task),
        }
    }
}

impl std::fmt::Debug for NagScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NagScheduler")
            .field("settings", &self.settings)
            .finish()
    }
}

/// Returns `false` once the incident is gone or closed.
fn tick_once(
    incident: &Weak<Mutex<Incident>>,
    settings: &NagSettings,
    gateway: &dyn MessagingGateway,
) -> bool {
    let Some(incident) = incident.upgrade() else {
        return false;
    };
    let mut incident = incident.lock();
    if incident.is_closed() {
        return false;
    }
    run_tick(&mut incident, Utc::now(), settings, gateway);
    true
}
