//! The channel-scoped pipeline registry.
//!
//! [`Registry`] is the plain data: channel id to an ordered, duplicate-free
//! [`MonitoredSet`]. A channel whose set becomes empty is removed.
//!
//! [`PipelineRegistry`] owns the live registry for the process and serialises
//! every mutation through a single writer gate. A mutation is applied to a copy,
//! the copy is saved through the [`RegistryStore`], and only then does it
//! replace the live registry. Readers therefore never observe a change that has
//! not been durably saved, and a failed save leaves memory untouched.

use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

use crate::{
    ChannelId, ChannelResolver, CiError, CiStatusClient, CommandError, MonitoredEntry,
    Normalized, PipelineDefinition, PipelineId, PipelineStatus, RegistryStore, StorageError,
    StoredShape,
};

/// Pipelines seeded for the default channel when no usable persisted state exists.
pub const DEFAULT_SEED: [u64; 2] = [123, 1234];

// ---------------------------------------------------------------------------
// Data model
// ---------------------------------------------------------------------------

/// Ordered collection of pipeline ids with no duplicates.
///
/// Insertion order is kept only so listings are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MonitoredSet(Vec<PipelineId>);

impl MonitoredSet {
    pub fn contains(&self, id: PipelineId) -> bool {
        self.0.contains(&id)
    }

    /// Appends `id`; returns `false` if it was already present.
    pub fn insert(&mut self, id: PipelineId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Removes `id`; returns `false` if it was not present.
    pub fn remove(&mut self, id: PipelineId) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| *existing != id);
        self.0.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[PipelineId] {
        &self.0
    }
}

/// Mapping from resolved channel id to its monitored set.
///
/// Serialises as `{"<channel id>": [<pipeline id>, ...], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Registry {
    channels: BTreeMap<ChannelId, MonitoredSet>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding only [`DEFAULT_SEED`] for `channel`.
    pub fn seeded(channel: &ChannelId) -> Self {
        let mut registry = Self::new();
        for id in DEFAULT_SEED {
            registry.insert(channel, PipelineId::new(id));
        }
        registry
    }

    pub fn contains(&self, channel: &ChannelId, id: PipelineId) -> bool {
        self.channels
            .get(channel)
            .is_some_and(|set| set.contains(id))
    }

    /// Pipelines monitored in `channel`, in insertion order. Empty if none.
    pub fn pipelines(&self, channel: &ChannelId) -> &[PipelineId] {
        self.channels
            .get(channel)
            .map(MonitoredSet::as_slice)
            .unwrap_or_default()
    }

    /// Adds `id` to `channel`; returns `false` if it was already monitored there.
    pub fn insert(&mut self, channel: &ChannelId, id: PipelineId) -> bool {
        self.channels.entry(channel.clone()).or_default().insert(id)
    }

    /// Removes `id` from `channel`, dropping the channel once its set is empty.
    /// Returns `false` if it was not monitored there.
    pub fn remove(&mut self, channel: &ChannelId, id: PipelineId) -> bool {
        let Some(set) = self.channels.get_mut(channel) else {
            return false;
        };
        let removed = set.remove(id);
        if set.is_empty() {
            self.channels.remove(channel);
        }
        removed
    }

    pub fn channels(&self) -> impl Iterator<Item = (&ChannelId, &MonitoredSet)> {
        self.channels.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Where the registry loaded at startup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrySource {
    /// Read from storage in the given shape.
    Persisted {
        shape: StoredShape,
        /// Storage differs from the canonical form of what was loaded.
        stale: bool,
    },
    /// Nothing usable was stored; [`Registry::seeded`] was used.
    Seeded,
}

impl RegistrySource {
    /// Whether storage should be rewritten with the loaded registry.
    pub fn needs_rewrite(self) -> bool {
        matches!(self, Self::Persisted { stale: true, .. })
    }
}

/// Reads the registry from `store`, never failing.
///
/// Missing, unreadable, or malformed storage all degrade to the default seed
/// for `default_channel`.
#[instrument(skip_all, fields(default_channel = %default_channel))]
pub async fn load_registry(
    store: &dyn RegistryStore,
    resolver: &dyn ChannelResolver,
    default_channel: &ChannelId,
) -> (Registry, RegistrySource) {
    let stored = match store.load().await {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            info!("no persisted registry found; using default seed");
            return (Registry::seeded(default_channel), RegistrySource::Seeded);
        }
        Err(err) => {
            warn!(error = %err, "persisted registry unreadable; using default seed");
            return (Registry::seeded(default_channel), RegistrySource::Seeded);
        }
    };

    let shape = stored.shape();
    match stored.normalize(resolver, default_channel).await {
        Ok(Normalized { registry, altered }) => {
            info!(
                ?shape,
                altered,
                channels = registry.channels().count(),
                "loaded persisted registry"
            );
            (
                registry,
                RegistrySource::Persisted {
                    shape,
                    stale: altered,
                },
            )
        }
        Err(err) => {
            warn!(error = %err, "persisted registry malformed; using default seed");
            (Registry::seeded(default_channel), RegistrySource::Seeded)
        }
    }
}

// ---------------------------------------------------------------------------
// Operation outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    AlreadyMonitored(PipelineId),
    Added {
        pipeline: PipelineDefinition,
        /// The channel's full monitored set after the addition.
        monitored: Vec<MonitoredEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    NotMonitored(PipelineId),
    Removed {
        pipeline_id: PipelineId,
        /// What is still monitored in the channel; empty if the channel was dropped.
        remaining: Vec<MonitoredEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    NoneMonitored,
    /// One result per monitored pipeline, in registry order.
    Statuses(Vec<Result<PipelineStatus, CiError>>),
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Process-wide owner of the registry.
pub struct PipelineRegistry {
    state: RwLock<Registry>,
    write_gate: Mutex<()>,
    store: Arc<dyn RegistryStore>,
    client: Arc<dyn CiStatusClient>,
}

impl PipelineRegistry {
    pub fn new(
        registry: Registry,
        store: Arc<dyn RegistryStore>,
        client: Arc<dyn CiStatusClient>,
    ) -> Self {
        Self {
            state: RwLock::new(registry),
            write_gate: Mutex::new(()),
            store,
            client,
        }
    }

    /// A copy of the current registry.
    pub async fn snapshot(&self) -> Registry {
        self.state.read().await.clone()
    }

    /// Starts monitoring `pipeline_id` in `channel`.
    ///
    /// The pipeline must exist at the provider; a failed lookup is returned
    /// without touching the registry. Its queue status is not interpreted, so
    /// a pipeline in a status this bot does not know can still be monitored.
    #[instrument(skip_all, fields(channel = %channel, pipeline_id = %pipeline_id))]
    pub async fn add(
        &self,
        channel: &ChannelId,
        pipeline_id: PipelineId,
    ) -> Result<AddOutcome, CommandError> {
        if self.state.read().await.contains(channel, pipeline_id) {
            return Ok(AddOutcome::AlreadyMonitored(pipeline_id));
        }

        let pipeline = self.client.fetch_definition(pipeline_id).await?;

        let monitored = {
            let _gate = self.write_gate.lock().await;
            let mut next = self.state.read().await.clone();
            if !next.insert(channel, pipeline_id) {
                // Lost a race with a concurrent add of the same id.
                return Ok(AddOutcome::AlreadyMonitored(pipeline_id));
            }
            self.commit(next).await?;
            self.state.read().await.pipelines(channel).to_vec()
        };

        info!(name = %pipeline.name, "pipeline added to channel");
        Ok(AddOutcome::Added {
            pipeline,
            monitored: self.describe(&monitored).await,
        })
    }

    /// Stops monitoring `pipeline_id` in `channel`.
    #[instrument(skip_all, fields(channel = %channel, pipeline_id = %pipeline_id))]
    pub async fn remove(
        &self,
        channel: &ChannelId,
        pipeline_id: PipelineId,
    ) -> Result<RemoveOutcome, CommandError> {
        let remaining = {
            let _gate = self.write_gate.lock().await;
            let mut next = self.state.read().await.clone();
            if !next.remove(channel, pipeline_id) {
                return Ok(RemoveOutcome::NotMonitored(pipeline_id));
            }
            self.commit(next).await?;
            self.state.read().await.pipelines(channel).to_vec()
        };

        info!("pipeline removed from channel");
        Ok(RemoveOutcome::Removed {
            pipeline_id,
            remaining: self.describe(&remaining).await,
        })
    }

    /// Fetches live status for every pipeline monitored in `channel`.
    #[instrument(skip_all, fields(channel = %channel))]
    pub async fn list(&self, channel: &ChannelId) -> ListOutcome {
        let ids = self.state.read().await.pipelines(channel).to_vec();
        if ids.is_empty() {
            return ListOutcome::NoneMonitored;
        }

        let mut statuses = Vec::with_capacity(ids.len());
        for id in ids {
            statuses.push(self.client.fetch_status(id).await);
        }
        ListOutcome::Statuses(statuses)
    }

    /// Writes the current registry to storage.
    pub async fn persist(&self) -> Result<(), StorageError> {
        let _gate = self.write_gate.lock().await;
        let snapshot = self.state.read().await.clone();
        self.store.save(&snapshot).await
    }

    /// Saves `next` and makes it the live registry. Caller must hold the write gate.
    async fn commit(&self, next: Registry) -> Result<(), StorageError> {
        if let Err(err) = self.store.save(&next).await {
            warn!(error = %err, "failed to persist registry; mutation discarded");
            return Err(err);
        }
        *self.state.write().await = next;
        Ok(())
    }

    /// Annotates `ids` with their live display names, one lookup each.
    async fn describe(&self, ids: &[PipelineId]) -> Vec<MonitoredEntry> {
        let mut entries = Vec::with_capacity(ids.len());
        for &id in ids {
            let name = self.client.fetch_definition(id).await.ok().map(|d| d.name);
            entries.push(MonitoredEntry { id, name });
        }
        entries
    }
}
