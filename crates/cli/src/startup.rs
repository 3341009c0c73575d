//! Startup steps that run before the listener accepts requests.

use std::sync::Arc;

use pipeline::{
    load_registry, ChannelId, ChannelResolver, CiStatusClient, PipelineRegistry, RegistryStore,
    DEFAULT_CHANNEL_FALLBACK,
};
use tracing::{info, warn};

/// Resolves the configured default channel name, falling back to
/// [`DEFAULT_CHANNEL_FALLBACK`] when it is unset, unknown, or lookup fails.
pub async fn default_channel(resolver: &dyn ChannelResolver, name: Option<&str>) -> ChannelId {
    let Some(name) = name else {
        info!(channel = DEFAULT_CHANNEL_FALLBACK, "no default channel configured");
        return ChannelId::fallback();
    };
    match resolver.resolve(name).await {
        Ok(Some(id)) => {
            info!(name, channel = %id, "default channel resolved");
            id
        }
        Ok(None) => {
            warn!(name, "default channel not found; using fallback");
            ChannelId::fallback()
        }
        Err(err) => {
            warn!(name, error = %err, "default channel lookup failed; using fallback");
            ChannelId::fallback()
        }
    }
}

/// Loads the persisted registry and, if storage does not already hold it in
/// canonical form, rewrites it. A failed rewrite is logged and the bot carries
/// on with the loaded data.
pub async fn open_registry(
    store: Arc<dyn RegistryStore>,
    resolver: &dyn ChannelResolver,
    default_channel: &ChannelId,
    client: Arc<dyn CiStatusClient>,
) -> Arc<PipelineRegistry> {
    let (registry, source) = load_registry(store.as_ref(), resolver, default_channel).await;
    let registry = Arc::new(PipelineRegistry::new(registry, store, client));

    if source.needs_rewrite() {
        match registry.persist().await {
            Ok(()) => info!(?source, "rewrote registry in canonical form"),
            Err(err) => warn!(?source, error = %err, "could not rewrite stored registry"),
        }
    }
    registry
}
