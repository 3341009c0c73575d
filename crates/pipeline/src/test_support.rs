//! In-memory implementations of the port traits for unit tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;

use crate::{
    ChannelId, ChannelResolver, CiError, CiStatusClient, PipelineDefinition, PipelineId,
    QueueStatus, Registry, RegistryStore, ResolveError, StatusIndicator, StorageError,
    StoredRegistry,
};

// ---------------------------------------------------------------------------
// CI client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch(PipelineId),
    Set(PipelineId, QueueStatus),
}

/// Pipelines not registered with the fake answer fetches with HTTP 404.
#[derive(Default)]
pub struct FakeCiClient {
    pipelines: Mutex<HashMap<PipelineId, (String, QueueStatus)>>,
    /// Pipelines whose provider status is outside the known three: (name, raw status).
    unknown: HashMap<PipelineId, (String, String)>,
    failing_updates: HashMap<PipelineId, StatusIndicator>,
    calls: Mutex<Vec<Call>>,
}

impl FakeCiClient {
    pub fn with_pipeline(self, id: u64, name: &str, status: QueueStatus) -> Self {
        self.pipelines
            .lock()
            .unwrap()
            .insert(PipelineId::new(id), (name.to_string(), status));
        self
    }

    pub fn with_unknown_status(mut self, id: u64, name: &str, value: &str) -> Self {
        self.unknown
            .insert(PipelineId::new(id), (name.to_string(), value.to_string()));
        self
    }

    pub fn failing_updates_for(mut self, id: u64, indicator: StatusIndicator) -> Self {
        self.failing_updates.insert(PipelineId::new(id), indicator);
        self
    }

    pub fn status_of(&self, id: u64) -> Option<QueueStatus> {
        self.pipelines
            .lock()
            .unwrap()
            .get(&PipelineId::new(id))
            .map(|(_, status)| *status)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CiStatusClient for FakeCiClient {
    async fn fetch_definition(
        &self,
        pipeline_id: PipelineId,
    ) -> Result<PipelineDefinition, CiError> {
        self.calls.lock().unwrap().push(Call::Fetch(pipeline_id));
        if let Some((name, value)) = self.unknown.get(&pipeline_id) {
            return Ok(PipelineDefinition {
                id: pipeline_id,
                name: name.clone(),
                queue_status: value.clone(),
            });
        }
        match self.pipelines.lock().unwrap().get(&pipeline_id) {
            Some((name, status)) => Ok(PipelineDefinition {
                id: pipeline_id,
                name: name.clone(),
                queue_status: status.as_str().to_string(),
            }),
            None => Err(CiError::FetchFailed {
                pipeline_id,
                indicator: StatusIndicator::Http(404),
            }),
        }
    }

    async fn set_status(
        &self,
        pipeline_id: PipelineId,
        desired: QueueStatus,
    ) -> Result<String, CiError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Set(pipeline_id, desired));
        if let Some(indicator) = self.failing_updates.get(&pipeline_id) {
            return Err(CiError::UpdateFailed {
                pipeline_id,
                indicator: *indicator,
            });
        }
        let mut pipelines = self.pipelines.lock().unwrap();
        match pipelines.get_mut(&pipeline_id) {
            Some((name, status)) => {
                *status = desired;
                Ok(name.clone())
            }
            None => Err(CiError::FetchForUpdateFailed {
                pipeline_id,
                indicator: StatusIndicator::Http(404),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel resolver
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeResolver {
    channels: HashMap<String, ChannelId>,
    failing: HashSet<String>,
}

impl FakeResolver {
    pub fn with_channel(mut self, name: &str, id: &str) -> Self {
        self.channels
            .insert(name.to_string(), ChannelId::new(id).unwrap());
        self
    }

    pub fn failing_on(mut self, name: &str) -> Self {
        self.failing.insert(name.to_string());
        self
    }
}

#[async_trait]
impl ChannelResolver for FakeResolver {
    async fn resolve(&self, name: &str) -> Result<Option<ChannelId>, ResolveError> {
        let bare = name.trim_start_matches('#');
        if self.failing.contains(bare) {
            return Err(ResolveError("slack unavailable".to_string()));
        }
        Ok(self.channels.get(bare).cloned())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Keeps the registry as the same JSON text a file store would write.
#[derive(Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
    saved: Mutex<Option<Registry>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn with_raw(raw: &str) -> Self {
        let store = Self::default();
        *store.raw.lock().unwrap() = Some(raw.to_string());
        store
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn saved(&self) -> Option<Registry> {
        self.saved.lock().unwrap().clone()
    }

    pub fn raw(&self) -> Option<String> {
        self.raw.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn load(&self) -> Result<Option<StoredRegistry>, StorageError> {
        match self.raw.lock().unwrap().as_deref() {
            None => Ok(None),
            Some(raw) => serde_json::from_str(raw)
                .map(Some)
                .map_err(|err| StorageError::Malformed(err.to_string())),
        }
    }

    async fn save(&self, registry: &Registry) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                location: "memory".to_string(),
                message: "write refused".to_string(),
            });
        }
        let raw = serde_json::to_string(registry)
            .map_err(|err| StorageError::Malformed(err.to_string()))?;
        *self.raw.lock().unwrap() = Some(raw);
        *self.saved.lock().unwrap() = Some(registry.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
