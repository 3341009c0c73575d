//! pipewatch entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Load configuration** from the environment (and `.env` if present).
//! 2. **Wire observability**: JSON `tracing` output plus an optional OTLP
//!    exporter. All spans and events emitted by every crate flow through it.
//! 3. **Construct infrastructure**: `AzureDevOpsClient`, `SlackChannelResolver`,
//!    `JsonFileStore`, and inject them into the registry and dispatcher.
//! 4. **Load the registry**, rewriting legacy stored shapes.
//! 5. **Serve** slash commands until Ctrl-C.

mod config;
mod startup;
mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use azure_devops::AzureDevOpsClient;
use listener::ListenerState;
use pipeline::{CiStatusClient, CommandDispatcher, RegistryStore};
use slack::{SignatureVerifier, SlackChannelResolver};
use storage::JsonFileStore;
use tracing::{info, warn};

use crate::{config::AppConfig, telemetry::Telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let telemetry = Telemetry::init().context("failed to initialise telemetry")?;

    let result = run().await;
    if let Err(err) = &result {
        tracing::error!(error = %format!("{err:#}"), "pipewatch exited with an error");
    }
    telemetry.shutdown();
    result
}

async fn run() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_addr = %config.listen_addr,
        storage_path = %config.storage_path.display(),
        "pipewatch starting"
    );

    let verifier = match config.slack.signing_secret() {
        Some(secret) => Some(SignatureVerifier::new(secret)),
        None => {
            warn!("SLACK_SIGNING_SECRET not set; request signatures will not be verified");
            None
        }
    };

    let resolver =
        SlackChannelResolver::new(config.slack.clone()).context("failed to build Slack client")?;
    let client: Arc<dyn CiStatusClient> = Arc::new(
        AzureDevOpsClient::new(config.azure.clone())
            .context("failed to build Azure DevOps client")?,
    );
    let store: Arc<dyn RegistryStore> = Arc::new(JsonFileStore::new(config.storage_path.clone()));

    let default_channel =
        startup::default_channel(&resolver, config.slack_channel.as_deref()).await;
    let registry =
        startup::open_registry(store, &resolver, &default_channel, client.clone()).await;

    let state = Arc::new(ListenerState {
        dispatcher: Arc::new(CommandDispatcher::new(registry, client)),
        verifier,
        default_channel,
    });

    listener::serve(config.listen_addr, listener::router(state), shutdown_signal()).await?;
    info!("pipewatch stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
