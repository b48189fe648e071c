//! # incident_core
//!
//! Incident session engine for incidentbot.
//!
//! This crate tracks ad-hoc incidents inside chat channels: starting one,
//! assigning responder roles, keeping a chronological log of the channel,
//! nagging people about unclaimed roles and silence, and exporting the log
//! when the incident is resolved.
//!
//! # Architecture
//!
//! - **Registry**: Owns the channel → incident map and the lifecycle operations
//! - **Incident**: The record for one active incident
//! - **History**: Append-only message log and the exported incident document
//! - **Nag**: Per-incident reminder task with an explicit cancel handle
//! - **Status**: Summaries of every active incident
//! - **Commands**: Command table mapping chat commands to registry operations
//! - **Gateway**: Outbound messages and uploads, implemented by the host
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use incident_core::{
//!     ChannelRef, CommandTable, Identity, IncidentConfig, IncidentRegistry, MockGateway,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = IncidentConfig::from_env()?;
//!     let registry = IncidentRegistry::new(config.clone(), Arc::new(MockGateway::new()))?;
//!     let commands = CommandTable::standard(&config);
//!
//!     let channel = ChannelRef::new("C024BE91L", "ops");
//!     let alice = Identity::new("alice", "Alice Smith");
//!     let line = ".start DB outage";
//!     if let Some(reply) = commands.handle_message(&registry, line, &alice, &channel) {
//!         println!("{}", reply);
//!     }
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod incident;
pub mod mock;
pub mod nag;
pub mod registry;
pub mod status;
pub mod time;
pub mod types;

// Re-export main types for convenience
pub use commands::{
    CommandAction, CommandSpec, CommandTable, CommandTableBuilder, Invocation, ParamContract,
    Reply,
};
pub use config::{IncidentConfig, MAX_INTERVAL_SECS};
pub use error::{IncidentError, IncidentResult};
pub use gateway::{FileUpload, GatewayError, GatewayResult, MessagingGateway};
pub use history::{slugify, ExportDocument, HistoryEntry, HistoryLog};
pub use incident::{collaboration_link, Incident, IncidentId, RoleAssignments, RoleSlot};
pub use mock::{MockGateway, SentMessage, UploadedFile};
pub use nag::{run_tick, NagHandle, NagScheduler, NagSettings, TickOutcome};
pub use registry::{IncidentRegistry, ResolutionSummary, RoleAssignment, StartConfirmation};
pub use status::{IncidentSummary, StatusReport, SummaryField};
pub use time::{format_duration, format_elapsed, format_timestamp};
pub use types::{ChannelId, ChannelRef, Identity, Role};
