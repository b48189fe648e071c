//! The incident record for one channel.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{IncidentError, IncidentResult};
use crate::history::{HistoryEntry, HistoryLog};
use crate::nag::NagHandle;
use crate::types::{ChannelRef, Identity, Role};

/// Unique identifier of one incident, distinct from its channel so a reused
/// channel slot never aliases an earlier incident.
pub type IncidentId = Uuid;

/// Build the collaboration link for a title: every whitespace character
/// becomes `-`.
pub fn collaboration_link(base: &str, title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();
    format!("{}{}", base, slug)
}

/// A role and whoever currently holds it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleSlot {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

/// Role assignments over a fixed role set, kept in configured order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleAssignments {
    slots: Vec<RoleSlot>,
}

impl RoleAssignments {
    /// Every role starts unassigned.
    pub fn new(roles: &[Role]) -> Self {
        Self {
            slots: roles
                .iter()
                .map(|&role| RoleSlot {
                    role,
                    assignee: None,
                })
                .collect(),
        }
    }

    /// Set the holder of `role`. Roles outside the configured set are rejected.
    pub fn assign(&mut self, role: Role, assignee: impl Into<String>) -> IncidentResult<()> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| slot.role == role)
            .ok_or_else(|| IncidentError::UnknownRole(role.to_string()))?;
        slot.assignee = Some(assignee.into());
        Ok(())
    }

    pub fn assignee(&self, role: Role) -> Option<&str> {
        self.slots
            .iter()
            .find(|slot| slot.role == role)
            .and_then(|slot| slot.assignee.as_deref())
    }

    /// Configured roles nobody has claimed yet.
    pub fn missing(&self) -> Vec<Role> {
        self.slots
            .iter()
            .filter(|slot| slot.assignee.is_none())
            .map(|slot| slot.role)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoleSlot> {
        self.slots.iter()
    }
}

/// One active incident.
#[derive(Debug)]
pub struct Incident {
    id: IncidentId,
    channel: ChannelRef,
    title: String,
    reporter: Identity,
    started_at: DateTime<Utc>,
    last_activity_at: DateTime<Utc>,
    collaboration_link: String,
    roles: RoleAssignments,
    history: HistoryLog,
    nag: Option<NagHandle>,
    closed: bool,
}

impl Incident {
    pub fn new(
        channel: ChannelRef,
        reporter: Identity,
        title: impl Into<String>,
        roles: &[Role],
        link_base: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let title = title.into();
        Self {
            id: Uuid::new_v4(),
            collaboration_link: collaboration_link(link_base, &title),
            channel,
            title,
            reporter,
            started_at: now,
            last_activity_at: now,
            roles: RoleAssignments::new(roles),
            history: HistoryLog::new(),
            nag: None,
            closed: false,
        }
    }

    pub fn id(&self) -> IncidentId {
        self.id
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    pub fn channel_id(&self) -> &str {
        &self.channel.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn reporter(&self) -> &Identity {
        &self.reporter
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_activity_at
    }

    pub fn collaboration_link(&self) -> &str {
        &self.collaboration_link
    }

    pub fn roles(&self) -> &RoleAssignments {
        &self.roles
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        now - self.started_at
    }

    /// Time since the last recorded activity.
    pub fn idle(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity_at
    }

    /// Mark the incident active as of `now`. Never moves the clock backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.last_activity_at {
            self.last_activity_at = now;
        }
    }

    pub fn assign(&mut self, role: Role, assignee: impl Into<String>) -> IncidentResult<()> {
        self.roles.assign(role, assignee)
    }

    /// Append an observed chat message and count it as activity.
    pub fn record_message(
        &mut self,
        author: impl Into<String>,
        text: impl Into<String>,
        now: DateTime<Utc>,
    ) {
        self.history.append(HistoryEntry::new(now, author, text));
        self.touch(now);
        debug!(
            "Recorded message #{} for incident {}",
            self.history.len(),
            self.id
        );
    }

    /// Take ownership of the reminder task. Replaces (and cancels) any previous one.
    pub(crate) fn attach_nag(&mut self, handle: NagHandle) {
        if let Some(mut previous) = self.nag.replace(handle) {
            previous.cancel();
        }
    }

    pub fn has_nag(&self) -> bool {
        self.nag.as_ref().is_some_and(|nag| !nag.is_cancelled())
    }

    /// Close the incident and cancel its reminder task. Returns `false` if it
    /// was already closed.
    pub(crate) fn close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        if let Some(nag) = self.nag.as_mut() {
            nag.cancel();
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(now: DateTime<Utc>) -> Incident {
        Incident::new(
            ChannelRef::new("C1", "ops"),
            Identity::new("alice", "Alice Smith"),
            "DB outage",
            &Role::all(),
            "g.co/hangout/example.com/incident-",
            now,
        )
    }

    #[test]
    fn test_collaboration_link_replaces_whitespace() {
        assert_eq!(
            collaboration_link("https://meet/", "DB  outage\tEU"),
            "https://meet/DB--outage-EU"
        );
    }

    #[test]
    fn test_new_incident_starts_empty() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let incident = sample(now);

        assert_eq!(incident.title(), "DB outage");
        assert_eq!(incident.started_at(), now);
        assert_eq!(incident.last_activity_at(), now);
        assert_eq!(incident.roles().missing(), Role::all());
        assert!(incident.history().is_empty());
        assert_eq!(
            incident.collaboration_link(),
            "g.co/hangout/example.com/incident-DB-outage"
        );
        assert!(!incident.is_closed());
        assert!(!incident.has_nag());
    }

    #[test]
    fn test_touch_is_monotonic() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut incident = sample(now);

        incident.touch(now + Duration::minutes(2));
        incident.touch(now + Duration::minutes(1));
        assert_eq!(incident.last_activity_at(), now + Duration::minutes(2));
    }

    #[test]
    fn test_record_message_bumps_activity() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut incident = sample(now);

        incident.record_message("bob", "looking at replicas", now + Duration::seconds(30));
        assert_eq!(incident.history().len(), 1);
        assert_eq!(incident.last_activity_at(), now + Duration::seconds(30));
    }

    #[test]
    fn test_assign_only_touches_one_role() {
        let now = Utc::now();
        let mut incident = sample(now);

        incident.assign(Role::Commander, "Bob").unwrap();
        assert_eq!(incident.roles().assignee(Role::Commander), Some("Bob"));
        assert_eq!(
            incident.roles().missing(),
            vec![Role::Communications, Role::Planning, Role::Operations]
        );

        incident.assign(Role::Commander, "Carol").unwrap();
        assert_eq!(incident.roles().assignee(Role::Commander), Some("Carol"));
    }

    #[test]
    fn test_assign_outside_configured_roles() {
        let mut incident = Incident::new(
            ChannelRef::private("D1"),
            Identity::named("alice"),
            "x",
            &[Role::Commander],
            "",
            Utc::now(),
        );
        let err = incident.assign(Role::Planning, "Bob").unwrap_err();
        assert!(matches!(err, IncidentError::UnknownRole(_)));
    }

    #[test]
    fn test_close_once() {
        let mut incident = sample(Utc::now());
        assert!(incident.close());
        assert!(!incident.close());
        assert!(incident.is_closed());
    }
}
