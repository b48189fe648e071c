//! Outbound messaging gateway.
//!
//! The core never talks to a chat platform directly. Everything it wants to
//! say goes through a [`MessagingGateway`], which is expected to hand the
//! message off (queue, spawn, buffer) and return without waiting on the
//! network. Delivery failures belong to the gateway; the core logs them and
//! moves on.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors reported by a gateway when a message could not be handed off.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A document to upload into a channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileUpload {
    /// Channel the file is shared into
    #[serde(rename = "channelId")]
    pub channel_id: String,
    /// File name derived from the title, e.g. `db-outage-incident-log.md`
    pub filename: String,
    /// Platform file type hint, e.g. `markdown`
    #[serde(rename = "fileType")]
    pub file_type: String,
    /// File body
    pub content: String,
}

/// Fire-and-forget delivery of chat messages and files.
pub trait MessagingGateway: Send + Sync {
    /// Post a text message into a channel.
    fn send_message(&self, channel_id: &str, text: &str) -> GatewayResult<()>;

    /// Upload a document into a channel.
    fn upload_file(&self, title: &str, upload: FileUpload) -> GatewayResult<()>;
}

/// Send a message, logging instead of propagating a failure.
pub(crate) fn deliver_message(gateway: &dyn MessagingGateway, channel_id: &str, text: &str) {
    if let Err(e) = gateway.send_message(channel_id, text) {
        warn!("Failed to send message to {}: {}", channel_id, e);
    }
}

/// Upload a file, logging instead of propagating a failure.
pub(crate) fn deliver_upload(gateway: &dyn MessagingGateway, title: &str, upload: FileUpload) {
    let channel_id = upload.channel_id.clone();
    if let Err(e) = gateway.upload_file(title, upload) {
        warn!("Failed to upload {:?} to {}: {}", title, channel_id, e);
    }
}
