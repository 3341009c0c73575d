//! Port traits implemented by the infrastructure crates.
//!
//! The domain crate never performs I/O; it calls these traits and the
//! composition root injects concrete implementations (`azure-devops`, `slack`,
//! `storage`). All traits are object safe so they can be held as
//! `Arc<dyn Trait>`.

use async_trait::async_trait;

use crate::{
    ChannelId, CiError, PipelineDefinition, PipelineId, PipelineStatus, QueueStatus, Registry,
    ResolveError, StorageError, StoredRegistry,
};

/// Read and update access to pipeline queue status at the CI provider.
#[async_trait]
pub trait CiStatusClient: Send + Sync {
    /// Fetches a pipeline's display name and its queue status exactly as the
    /// provider spells it.
    async fn fetch_definition(
        &self,
        pipeline_id: PipelineId,
    ) -> Result<PipelineDefinition, CiError>;

    /// Fetches the display name and current queue status of a pipeline.
    ///
    /// A status string outside the known three is returned as
    /// [`CiError::UnknownStatus`].
    async fn fetch_status(&self, pipeline_id: PipelineId) -> Result<PipelineStatus, CiError> {
        self.fetch_definition(pipeline_id).await?.into_status()
    }

    /// Applies `desired` as the pipeline's queue status and returns its display name.
    ///
    /// The caller decides the target status; this only applies and confirms it.
    async fn set_status(
        &self,
        pipeline_id: PipelineId,
        desired: QueueStatus,
    ) -> Result<String, CiError>;
}

/// Maps human-readable channel names to stable channel identifiers.
#[async_trait]
pub trait ChannelResolver: Send + Sync {
    /// Resolves `name` (with or without the leading `#`).
    ///
    /// `Ok(None)` means the platform answered but knows no such channel.
    async fn resolve(&self, name: &str) -> Result<Option<ChannelId>, ResolveError>;
}

/// Durable storage for the registry.
///
/// Implementations must have the registry durably saved by the time
/// [`RegistryStore::save`] returns `Ok`.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Reads the persisted registry in whatever shape it was stored.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<StoredRegistry>, StorageError>;

    /// Replaces the persisted registry with `registry`.
    async fn save(&self, registry: &Registry) -> Result<(), StorageError>;
}
