//! Error types for the pipeline-watch domain.
//!
//! [`CiError`] and [`StorageError`] are produced by the port implementations
//! (see [`crate::ports`]). Their `Display` output is the text shown to the
//! invoker: every externally visible failure is embedded in the normal
//! response body, so these strings are part of the user-facing contract.
//!
//! Malformed command text is not an error in this sense; see
//! [`crate::InvalidArguments`].

use thiserror::Error;

use crate::PipelineId;

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Opaque indicator of why a provider call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    /// The provider answered with a non-success HTTP status code.
    Http(u16),
    /// No answer arrived within the configured request timeout.
    Timeout,
    /// The provider could not be reached or the answer could not be read.
    Unavailable,
}

impl std::fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::Timeout => f.write_str("timeout"),
            Self::Unavailable => f.write_str("unavailable"),
        }
    }
}

/// Failure of a single CI provider call for one pipeline.
///
/// Never escapes as a panic: the client returns it, the dispatcher renders it
/// for that pipeline and carries on with the rest of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CiError {
    /// Reading the pipeline's status failed.
    #[error("Error: Could not fetch pipeline {pipeline_id}. Status code: {indicator}")]
    FetchFailed {
        pipeline_id: PipelineId,
        indicator: StatusIndicator,
    },

    /// Reading the pipeline definition immediately before a toggle failed.
    #[error("Error: Could not fetch pipeline {pipeline_id} for update. Status code: {indicator}")]
    FetchForUpdateFailed {
        pipeline_id: PipelineId,
        indicator: StatusIndicator,
    },

    /// Writing the new queue status failed.
    #[error("Error: Failed to update pipeline {pipeline_id}. Status code: {indicator}")]
    UpdateFailed {
        pipeline_id: PipelineId,
        indicator: StatusIndicator,
    },

    /// The provider reported a queue status outside {enabled, paused, disabled}.
    #[error("Error: Unknown queueStatus {value} for pipeline {pipeline_id}")]
    UnknownStatus {
        pipeline_id: PipelineId,
        /// The status string exactly as the provider returned it.
        value: String,
    },
}

impl CiError {
    /// Re-labels a plain fetch failure as one that happened while preparing an update.
    pub fn for_update(self) -> Self {
        match self {
            Self::FetchFailed {
                pipeline_id,
                indicator,
            } => Self::FetchForUpdateFailed {
                pipeline_id,
                indicator,
            },
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// Storage and resolution errors
// ---------------------------------------------------------------------------

/// Failure of the registry storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("I/O error on {location}: {message}")]
    Io { location: String, message: String },

    /// Stored data exists but matches none of the accepted shapes.
    #[error("malformed registry data: {0}")]
    Malformed(String),
}

/// Failure to resolve a channel name through the messaging platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("channel lookup failed: {0}")]
pub struct ResolveError(pub String);

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

/// Failure of a registry operation (add / delete).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// The pipeline lookup that guards the mutation failed; nothing was changed.
    #[error(transparent)]
    Ci(#[from] CiError),

    /// The mutation could not be saved; the in-memory registry was left unchanged.
    #[error("Error: Could not save monitored pipelines: {0}")]
    Persistence(#[from] StorageError),
}
