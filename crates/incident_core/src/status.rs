//! Human-readable status summaries of active incidents.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::UNASSIGNED;
use crate::incident::Incident;
use crate::time::format_elapsed;

/// Marker color attached to every incident summary.
pub const SUMMARY_COLOR: &str = "#C0C0C0";

/// A titled value inside a summary block.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SummaryField {
    pub title: String,
    pub value: String,
}

impl SummaryField {
    fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

/// Summary block for one incident.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct IncidentSummary {
    pub title: String,
    pub color: String,
    #[serde(rename = "startedAt")]
    pub started_at: DateTime<Utc>,
    pub fields: Vec<SummaryField>,
}

impl IncidentSummary {
    /// Value of the field with the given title.
    pub fn field(&self, title: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.title == title)
            .map(|f| f.value.as_str())
    }
}

/// Snapshot an incident into a summary block.
pub fn summarize(incident: &Incident, now: DateTime<Utc>) -> IncidentSummary {
    let mut fields = vec![
        SummaryField::new("Duration", format_elapsed(incident.started_at(), now)),
        SummaryField::new("Channel", format!("#{}", incident.channel().display_name())),
    ];
    fields.extend(incident.roles().iter().map(|slot| {
        SummaryField::new(
            slot.role.label(),
            slot.assignee.as_deref().unwrap_or(UNASSIGNED),
        )
    }));
    fields.push(SummaryField::new(
        "Collaboration Link",
        incident.collaboration_link(),
    ));

    IncidentSummary {
        title: incident.title().to_string(),
        color: SUMMARY_COLOR.to_string(),
        started_at: incident.started_at(),
        fields,
    }
}

/// Status of every active incident.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StatusReport {
    NoActiveIncidents,
    Active {
        headline: String,
        incidents: Vec<IncidentSummary>,
    },
}

impl StatusReport {
    pub fn active_count(&self) -> usize {
        match self {
            Self::NoActiveIncidents => 0,
            Self::Active { incidents, .. } => incidents.len(),
        }
    }

    pub fn incidents(&self) -> &[IncidentSummary] {
        match self {
            Self::NoActiveIncidents => &[],
            Self::Active { incidents, .. } => incidents,
        }
    }
}

/// Build the report, oldest incident first.
pub fn render(mut summaries: Vec<IncidentSummary>) -> StatusReport {
    if summaries.is_empty() {
        return StatusReport::NoActiveIncidents;
    }
    summaries.sort_by_key(|s| s.started_at);

    let headline = match summaries.len() {
        1 => "There is 1 active incident:".to_string(),
        n => format!("There are {} active incidents:", n),
    };
    StatusReport::Active {
        headline,
        incidents: summaries,
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveIncidents => write!(f, "There are no active incidents!"),
            Self::Active {
                headline,
                incidents,
            } => {
                write!(f, "{}", headline)?;
                for incident in incidents {
                    write!(f, "\n\n*{}*", incident.title)?;
                    for field in &incident.fields {
                        write!(f, "\n> {}: {}", field.title, field.value)?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelRef, Identity, Role};
    use chrono::{Duration, TimeZone};

    fn incident(title: &str, channel: ChannelRef, now: DateTime<Utc>) -> Incident {
        Incident::new(
            channel,
            Identity::new("alice", "Alice"),
            title,
            &[Role::Commander, Role::Communications],
            "link/",
            now,
        )
    }

    #[test]
    fn test_render_empty() {
        let report = render(Vec::new());
        assert_eq!(report, StatusReport::NoActiveIncidents);
        assert_eq!(report.active_count(), 0);
        assert_eq!(report.to_string(), "There are no active incidents!");
    }

    #[test]
    fn test_summarize_fields() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let mut incident = incident("DB outage", ChannelRef::new("C1", "ops"), start);
        incident.assign(Role::Commander, "Bob").unwrap();

        let summary = summarize(&incident, start + Duration::seconds(2 * 3600 + 15 * 60 + 3));

        assert_eq!(summary.title, "DB outage");
        assert_eq!(summary.color, "#C0C0C0");
        assert_eq!(summary.field("Duration"), Some("2h 15m 3s"));
        assert_eq!(summary.field("Channel"), Some("#ops"));
        assert_eq!(summary.field("Commander"), Some("Bob"));
        assert_eq!(summary.field("Communications"), Some("_Unassigned_"));
        assert_eq!(summary.field("Collaboration Link"), Some("link/DB-outage"));
        assert_eq!(summary.field("Planning"), None);
    }

    #[test]
    fn test_private_channel_name() {
        let now = Utc::now();
        let summary = summarize(&incident("x", ChannelRef::private("D1"), now), now);
        assert_eq!(summary.field("Channel"), Some("#Private Message"));
    }

    #[test]
    fn test_render_orders_oldest_first() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let now = start + Duration::hours(1);
        let newer = summarize(
            &incident("newer", ChannelRef::new("C2", "b"), start + Duration::minutes(5)),
            now,
        );
        let older = summarize(&incident("older", ChannelRef::new("C1", "a"), start), now);

        let report = render(vec![newer, older]);

        assert_eq!(report.active_count(), 2);
        let titles: Vec<&str> = report.incidents().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["older", "newer"]);
        let text = report.to_string();
        assert!(text.starts_with("There are 2 active incidents:"));
        assert!(text.find("*older*").unwrap() < text.find("*newer*").unwrap());
    }

    #[test]
    fn test_render_single_headline() {
        let now = Utc::now();
        let report = render(vec![summarize(&incident("x", ChannelRef::new("C1", "a"), now), now)]);
        assert!(report.to_string().starts_with("There is 1 active incident:"));
        assert!(report.to_string().contains("> Commander: _Unassigned_"));
    }

    #[test]
    fn test_report_serializes_with_kind_tag() {
        let value = serde_json::to_value(render(Vec::new())).unwrap();
        assert_eq!(value["kind"], "noActiveIncidents");
    }
}
