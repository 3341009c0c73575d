//! Shared value types for the pipeline-watch domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! provider-reported values and participate in domain computations (the toggle
//! rule lives on [`QueueStatus`]).

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CiError, PipelineId};

// ---------------------------------------------------------------------------
// Queue status
// ---------------------------------------------------------------------------

/// Provider-reported queue mode of a pipeline definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    /// Runs normally.
    Enabled,
    /// Temporarily suspended; queued builds wait until resumed.
    Paused,
    /// Administratively turned off.
    Disabled,
}

impl QueueStatus {
    /// Returns the wire spelling used by the provider (`"enabled"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Paused => "paused",
            Self::Disabled => "disabled",
        }
    }

    /// The status a toggle request moves this pipeline to.
    ///
    /// `enabled -> paused`, `paused -> enabled`, `disabled -> enabled`.
    pub fn toggled(self) -> Self {
        match self {
            Self::Enabled => Self::Paused,
            Self::Paused | Self::Disabled => Self::Enabled,
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queue status string outside the three known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown queue status '{0}'")]
pub struct UnknownQueueStatus(pub String);

impl FromStr for QueueStatus {
    type Err = UnknownQueueStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "paused" => Ok(Self::Paused),
            "disabled" => Ok(Self::Disabled),
            other => Err(UnknownQueueStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Live pipeline data
// ---------------------------------------------------------------------------

/// Live status of one pipeline as returned by the CI provider.
///
/// Never cached: every report is built from a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub id: PipelineId,
    /// Display name of the pipeline definition.
    pub name: String,
    pub status: QueueStatus,
}

/// A pipeline definition as the provider describes it, with the queue status
/// still in the provider's spelling.
///
/// Registry operations only need the name, so they work from this and never
/// trip over a status value they do not understand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDefinition {
    pub id: PipelineId,
    pub name: String,
    pub queue_status: String,
}

impl PipelineDefinition {
    /// Interprets the queue status; a value outside the known three is
    /// [`CiError::UnknownStatus`].
    pub fn into_status(self) -> Result<PipelineStatus, CiError> {
        match self.queue_status.parse::<QueueStatus>() {
            Ok(status) => Ok(PipelineStatus {
                id: self.id,
                name: self.name,
                status,
            }),
            Err(UnknownQueueStatus(value)) => Err(CiError::UnknownStatus {
                pipeline_id: self.id,
                value,
            }),
        }
    }
}

/// A monitored pipeline annotated with its display name, if the lookup succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredEntry {
    pub id: PipelineId,
    pub name: Option<String>,
}

/// Confirmation that a toggle was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub id: PipelineId,
    pub name: String,
    /// The status the pipeline now has.
    pub status: QueueStatus,
}
