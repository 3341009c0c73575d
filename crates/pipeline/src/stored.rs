//! Shapes the registry has been persisted in over time, and their normalisation.
//!
//! Storage backends deserialise into [`StoredRegistry`] without interpreting
//! it; [`StoredRegistry::normalize`] turns any accepted shape into the
//! canonical [`Registry`]. Anything that matches none of the variants is a
//! [`StorageError::Malformed`] at the storage layer.

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{ChannelId, ChannelRef, ChannelResolver, PipelineId, Registry, StorageError};

/// A pipeline id as written by any historical version: a JSON integer or a
/// numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StoredPipelineId {
    Number(u64),
    Text(String),
}

impl StoredPipelineId {
    fn to_pipeline_id(&self) -> Option<PipelineId> {
        match self {
            Self::Number(n) => Some(PipelineId::new(*n)),
            Self::Text(s) => PipelineId::parse_literal(s.trim()),
        }
    }
}

/// Persisted registry in one of the accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StoredRegistry {
    /// Oldest shape: a single list of pipeline ids, implicitly for the default channel.
    FlatList(Vec<StoredPipelineId>),
    /// Channel key to id list, in file order. Keys are channel ids, or
    /// `#name`s in older files.
    ByChannel(IndexMap<String, Vec<StoredPipelineId>>),
}

/// A registry recovered from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub registry: Registry,
    /// Whether saving `registry` would write something other than what was
    /// read, such as after resolving names or dropping empty channels.
    pub altered: bool,
}

/// Which historical shape a [`StoredRegistry`] was read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredShape {
    /// Channel-id keyed mapping; what [`crate::RegistryStore::save`] writes today.
    Canonical,
    /// Flat list of ids.
    FlatList,
    /// Mapping with at least one `#name` key.
    NamedChannels,
}

impl StoredRegistry {
    pub fn shape(&self) -> StoredShape {
        match self {
            Self::FlatList(_) => StoredShape::FlatList,
            Self::ByChannel(map) if map.keys().any(|key| key.starts_with('#')) => {
                StoredShape::NamedChannels
            }
            Self::ByChannel(_) => StoredShape::Canonical,
        }
    }

    /// Converts the stored data into a canonical registry.
    ///
    /// Channel names are resolved through `resolver`; names that cannot be
    /// resolved, and empty keys, are filed under `default_channel`. Entries that
    /// end up under the same channel are merged in file order without
    /// duplicates. A pipeline id that is not a non-negative integer makes the
    /// whole payload malformed.
    pub async fn normalize(
        self,
        resolver: &dyn ChannelResolver,
        default_channel: &ChannelId,
    ) -> Result<Normalized, StorageError> {
        let mut registry = Registry::new();
        let mut altered = false;
        match self {
            Self::FlatList(ids) => {
                warn!(
                    channel = %default_channel,
                    "registry stored as a flat list; migrating to the default channel"
                );
                for id in convert_ids(&ids)? {
                    registry.insert(default_channel, id);
                }
                altered = true;
            }
            Self::ByChannel(map) => {
                for (key, ids) in map {
                    let channel = match ChannelRef::parse(&key) {
                        Some(ChannelRef::Id(id)) => id,
                        Some(ChannelRef::Name(name)) => {
                            resolve_or_default(resolver, &name, default_channel).await
                        }
                        None => default_channel.clone(),
                    };
                    if channel.as_str() != key {
                        altered = true;
                    }
                    if ids.is_empty() {
                        debug!(key = %key, "dropping stored channel with no pipelines");
                        altered = true;
                    }
                    for (stored, id) in ids.iter().zip(convert_ids(&ids)?) {
                        let fresh = registry.insert(&channel, id);
                        if !fresh || matches!(stored, StoredPipelineId::Text(_)) {
                            altered = true;
                        }
                    }
                }
            }
        }
        Ok(Normalized { registry, altered })
    }
}

fn convert_ids(ids: &[StoredPipelineId]) -> Result<Vec<PipelineId>, StorageError> {
    ids.iter()
        .map(|stored| {
            stored
                .to_pipeline_id()
                .ok_or_else(|| StorageError::Malformed(format!("invalid pipeline id {stored:?}")))
        })
        .collect()
}

async fn resolve_or_default(
    resolver: &dyn ChannelResolver,
    name: &str,
    default_channel: &ChannelId,
) -> ChannelId {
    match resolver.resolve(name).await {
        Ok(Some(id)) => {
            debug!(name, channel = %id, "resolved stored channel name");
            id
        }
        Ok(None) => {
            warn!(name, fallback = %default_channel, "stored channel name not found");
            default_channel.clone()
        }
        Err(err) => {
            warn!(name, fallback = %default_channel, error = %err, "stored channel name could not be resolved");
            default_channel.clone()
        }
    }
}
