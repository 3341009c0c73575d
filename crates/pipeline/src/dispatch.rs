//! Turns one inbound command into its reply text.
//!
//! The dispatcher is the only place that sequences parser, registry, CI client
//! and formatter. It never fails: every error becomes a line of reply text.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, Instrument};

use crate::{
    format, AddOutcome, ChannelId, CiError, CiStatusClient, Command, ListOutcome,
    PipelineId, PipelineRegistry, RemoveOutcome, RequestId, ToggleOutcome,
};

/// Who sees the reply. Replies are always posted to the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    InChannel,
}

/// Reply to a slash command, serialised as the JSON body Slack expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub response_type: ResponseType,
    pub text: String,
}

impl CommandResponse {
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            response_type: ResponseType::InChannel,
            text: text.into(),
        }
    }
}

pub struct CommandDispatcher {
    registry: Arc<PipelineRegistry>,
    client: Arc<dyn CiStatusClient>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<PipelineRegistry>, client: Arc<dyn CiStatusClient>) -> Self {
        Self { registry, client }
    }

    /// Handles the command `text` issued in `channel`.
    pub async fn dispatch(&self, channel: &ChannelId, text: &str) -> CommandResponse {
        let request_id = RequestId::new_random();
        let span = tracing::info_span!("dispatch", %request_id, %channel, command = tracing::field::Empty);
        async {
            let command = match Command::from_text(text) {
                Ok(command) => command,
                Err(invalid) => {
                    debug!(text, %invalid, "rejected command text");
                    return CommandResponse::in_channel(invalid.to_string());
                }
            };
            tracing::Span::current().record("command", command.kind());
            info!("handling command");
            CommandResponse::in_channel(self.execute(channel, command).await)
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, channel: &ChannelId, command: Command) -> String {
        match command {
            Command::Help => format::USAGE.to_string(),
            Command::Add(id) => match self.registry.add(channel, id).await {
                Ok(AddOutcome::AlreadyMonitored(id)) => format::already_monitored(id),
                Ok(AddOutcome::Added {
                    pipeline,
                    monitored,
                }) => format::added(&pipeline, &monitored),
                Err(err) => err.to_string(),
            },
            Command::Delete(id) => match self.registry.remove(channel, id).await {
                Ok(RemoveOutcome::NotMonitored(id)) => format::not_monitored(id),
                Ok(RemoveOutcome::Removed {
                    pipeline_id,
                    remaining,
                }) => format::removed(pipeline_id, &remaining),
                Err(err) => err.to_string(),
            },
            Command::List => match self.registry.list(channel).await {
                ListOutcome::NoneMonitored => format::NONE_MONITORED.to_string(),
                ListOutcome::Statuses(statuses) => statuses
                    .iter()
                    .map(|status| match status {
                        Ok(status) => format::status_line(status),
                        Err(err) => err.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            Command::Status {
                pipeline_ids,
                toggle,
            } => self.status_report(&pipeline_ids, toggle).await,
        }
    }

    /// One status line per id; when toggling, each id's confirmation follows
    /// its own status line. A failing id does not stop the rest of the batch.
    async fn status_report(&self, pipeline_ids: &[PipelineId], toggle: bool) -> String {
        let mut lines = Vec::with_capacity(pipeline_ids.len() * 2);
        for &id in pipeline_ids {
            match self.client.fetch_status(id).await {
                Ok(status) => lines.push(format::status_line(&status)),
                Err(err) => {
                    lines.push(err.to_string());
                    continue;
                }
            }
            if toggle {
                lines.push(match self.toggle(id).await {
                    Ok(outcome) => format::toggled_line(&outcome),
                    Err(err) => err.to_string(),
                });
            }
        }
        lines.join("\n")
    }

    /// Flips `id`'s queue status based on a fresh read of its current status.
    async fn toggle(&self, id: PipelineId) -> Result<ToggleOutcome, CiError> {
        let current = self
            .client
            .fetch_status(id)
            .await
            .map_err(CiError::for_update)?;
        let next = current.status.toggled();
        let name = self.client.set_status(id, next).await?;
        info!(pipeline_id = %id, from = %current.status, to = %next, "pipeline toggled");
        Ok(ToggleOutcome {
            id,
            name,
            status: next,
        })
    }
}
