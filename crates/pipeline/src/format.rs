//! Slack mrkdwn rendering of status reports and registry outcomes.

use crate::{
    MonitoredEntry, PipelineDefinition, PipelineId, PipelineStatus, QueueStatus, ToggleOutcome,
};

/// Reply to a command with no arguments.
pub const USAGE: &str = "Please provide a command (e.g., /pipeline-status list, /pipeline-status add [id], /pipeline-status delete [id], /pipeline-status toggle [id])";

/// Reply to `list` in a channel that monitors nothing.
pub const NONE_MONITORED: &str = "No pipelines are currently monitored in this channel.";

fn icon(status: QueueStatus) -> &'static str {
    match status {
        QueueStatus::Enabled => ":white_check_mark:",
        QueueStatus::Paused => ":double_vertical_bar:",
        QueueStatus::Disabled => ":x:",
    }
}

fn annotated(id: PipelineId, name: &str, verb: &str, status: QueueStatus) -> String {
    let icon = icon(status);
    format!("{icon} Pipeline '{name}' (ID: {id}) {verb} *{status}* {icon}")
}

/// `:white_check_mark: Pipeline 'Build' (ID: 12) is *enabled* :white_check_mark:`
pub fn status_line(pipeline: &PipelineStatus) -> String {
    annotated(pipeline.id, &pipeline.name, "is", pipeline.status)
}

/// Like [`status_line`] but reporting the new status of a toggled pipeline.
pub fn toggled_line(outcome: &ToggleOutcome) -> String {
    annotated(outcome.id, &outcome.name, "has been", outcome.status)
}

/// `12 (Build), 34 (34)`; an entry whose name lookup failed shows its id. `None` if empty.
fn monitored_list(entries: &[MonitoredEntry]) -> String {
    if entries.is_empty() {
        return "None".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let id = entry.id.to_string();
            let name = entry.name.as_deref().unwrap_or(&id);
            format!("{id} ({name})")
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn added(pipeline: &PipelineDefinition, monitored: &[MonitoredEntry]) -> String {
    format!(
        "Added pipeline '{}' (ID: {}) to monitored list.\nCurrent monitored pipelines: {}",
        pipeline.name,
        pipeline.id,
        monitored_list(monitored)
    )
}

pub fn already_monitored(id: PipelineId) -> String {
    format!("Pipeline ID {id} is already in the monitored list for this channel.")
}

pub fn removed(id: PipelineId, remaining: &[MonitoredEntry]) -> String {
    format!(
        "Removed pipeline ID {id} from monitored list.\nCurrent monitored pipelines: {}",
        monitored_list(remaining)
    )
}

pub fn not_monitored(id: PipelineId) -> String {
    format!("Pipeline ID {id} is not in the monitored list for this channel.")
}
