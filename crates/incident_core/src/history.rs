//! Append-only incident history and the exported incident log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::gateway::{deliver_upload, FileUpload, MessagingGateway};
use crate::incident::Incident;
use crate::time::{format_elapsed, format_timestamp};

/// Placeholder shown for a role nobody holds.
pub const UNASSIGNED: &str = "_Unassigned_";

/// File type hint passed along with exported logs.
pub const EXPORT_FILE_TYPE: &str = "markdown";

/// Convert a string to a file-name-safe slug
pub fn slugify(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// One observed chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(
        timestamp: DateTime<Utc>,
        author: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            author: author.into(),
            text: text.into(),
        }
    }

    /// `[timestamp] author: text`
    pub fn render(&self) -> String {
        format!("[{}] {}: {}", format_timestamp(self.timestamp), self.author, self.text)
    }
}

/// Insertion-ordered message log. Entries can only be appended.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryLog {
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries rendered one per line.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(HistoryEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A rendered incident log ready for upload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ExportDocument {
    /// Upload title, `"<incident title> Incident Log"`
    pub title: String,
    /// Suggested file name for gateways that store files
    pub filename: String,
    pub channel_id: String,
    pub content: String,
    /// Number of history lines in the document
    pub entries: usize,
}

impl ExportDocument {
    pub fn into_upload(self) -> (String, FileUpload) {
        (
            self.title,
            FileUpload {
                channel_id: self.channel_id,
                filename: self.filename,
                file_type: EXPORT_FILE_TYPE.to_string(),
                content: self.content,
            },
        )
    }
}

/// Render the incident log: a header block followed by every history line in
/// insertion order.
pub fn export(incident: &Incident, now: DateTime<Utc>) -> ExportDocument {
    let mut header = format!(
        "# {}\n\n\
         > *Incident Start*: {}\n\
         > *Incident Duration*: {}\n\
         > *Initiated By*: {}\n\
         > *Collaboration Link*: {}\n",
        incident.title(),
        format_timestamp(incident.started_at()),
        format_elapsed(incident.started_at(), now),
        incident.reporter().display_name,
        incident.collaboration_link(),
    );
    for slot in incident.roles().iter() {
        header.push_str(&format!(
            "> *{}*: {}\n",
            slot.role.label(),
            slot.assignee.as_deref().unwrap_or(UNASSIGNED)
        ));
    }
    header.push('\n');

    let title = format!("{} Incident Log", incident.title());
    ExportDocument {
        filename: format!("{}.md", slugify(&title)),
        title,
        channel_id: incident.channel_id().to_string(),
        content: header + &incident.history().render(),
        entries: incident.history().len(),
    }
}

/// Hand an export to the gateway. Delivery is not verified or retried.
pub fn upload(gateway: &dyn MessagingGateway, document: ExportDocument) {
    info!(
        "Uploading {:?} ({} entries) to {}",
        document.title, document.entries, document.channel_id
    );
    let (title, upload) = document.into_upload();
    deliver_upload(gateway, &title, upload);
}
