//! Recording gateway for testing.
//!
//! Captures every message and upload the core hands off so tests can assert
//! on what a chat channel would have seen, without a chat platform.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::gateway::{FileUpload, GatewayError, GatewayResult, MessagingGateway};

/// A captured `send_message` call.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel_id: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// A captured `upload_file` call.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub title: String,
    pub upload: FileUpload,
}

/// Mock gateway for testing.
#[derive(Clone, Default)]
pub struct MockGateway {
    messages: Arc<RwLock<Vec<SentMessage>>>,
    uploads: Arc<RwLock<Vec<UploadedFile>>>,
    /// Simulated failure returned from every call (calls are still captured).
    simulate_failure: Arc<RwLock<Option<String>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call report a delivery failure.
    pub fn simulate_failure(self, message: impl Into<String>) -> Self {
        *self.simulate_failure.write() = Some(message.into());
        self
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages.read().clone()
    }

    /// Texts sent to one channel, in order.
    pub fn messages_for(&self, channel_id: &str) -> Vec<String> {
        self.messages
            .read()
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn uploads(&self) -> Vec<UploadedFile> {
        self.uploads.read().clone()
    }

    pub fn message_count(&self) -> usize {
        self.messages.read().len()
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.read().len()
    }

    pub fn clear(&self) {
        self.messages.write().clear();
        self.uploads.write().clear();
    }

    fn failure(&self) -> GatewayResult<()> {
        match self.simulate_failure.read().as_ref() {
            Some(message) => Err(GatewayError::Delivery(message.clone())),
            None => Ok(()),
        }
    }
}

impl MessagingGateway for MockGateway {
    fn send_message(&self, channel_id: &str, text: &str) -> GatewayResult<()> {
        self.messages.write().push(SentMessage {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
            sent_at: Utc::now(),
        });
        self.failure()
    }

    fn upload_file(&self, title: &str, upload: FileUpload) -> GatewayResult<()> {
        self.uploads.write().push(UploadedFile {
            title: title.to_string(),
            upload,
        });
        self.failure()
    }
}
