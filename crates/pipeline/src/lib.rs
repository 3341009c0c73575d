//! Core domain for pipewatch: the channel-scoped pipeline registry and the
//! slash-command state machine.
//!
//! This crate contains every domain concept, newtype identifier, and error type
//! used by the bot. Infrastructure crates implement the port traits defined
//! here; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`PipelineId`, `ChannelId`, `RequestId`) |
//! | [`types`] | `QueueStatus` and the toggle rule, live pipeline data |
//! | [`errors`] | Provider, storage, resolution, and command errors |
//! | [`ports`] | `CiStatusClient`, `ChannelResolver`, `RegistryStore` |
//! | [`stored`] | Historical persisted shapes and their normalisation |
//! | [`registry`] | Registry data model and the serialised-writer service |
//! | [`command`] | Command grammar |
//! | [`format`] | Reply text rendering |
//! | [`dispatch`] | Command dispatcher |

pub mod command;
pub mod dispatch;
pub mod errors;
pub mod format;
pub mod identifiers;
pub mod ports;
pub mod registry;
pub mod stored;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use command::{Command, InvalidArguments};
pub use dispatch::{CommandDispatcher, CommandResponse, ResponseType};
pub use errors::{CiError, CommandError, ResolveError, StatusIndicator, StorageError};
pub use identifiers::{
    ChannelId, ChannelRef, PipelineId, RequestId, DEFAULT_CHANNEL_FALLBACK,
};
pub use ports::{ChannelResolver, CiStatusClient, RegistryStore};
pub use registry::{
    load_registry, AddOutcome, ListOutcome, MonitoredSet, PipelineRegistry, Registry,
    RegistrySource, RemoveOutcome, DEFAULT_SEED,
};
pub use stored::{Normalized, StoredPipelineId, StoredRegistry, StoredShape};
pub use types::{
    MonitoredEntry, PipelineDefinition, PipelineStatus, QueueStatus, ToggleOutcome,
    UnknownQueueStatus,
};
