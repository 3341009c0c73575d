//! Slack slash command payloads.
//!
//! Slash commands arrive as `application/x-www-form-urlencoded` POST bodies.
//! The body must be kept as raw bytes until the signature has been checked,
//! so decoding is a separate step from receiving.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The slash command fields this bot reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommandPayload {
    /// The command (e.g., "/pipeline-status").
    pub command: String,
    /// Text after the command.
    pub text: String,
    /// Channel ID where command was invoked. Absent in some test tooling.
    pub channel_id: Option<String>,
    /// Channel name.
    pub channel_name: String,
    /// User ID who invoked the command.
    pub user_id: String,
    /// Team ID.
    pub team_id: String,
}

impl SlashCommandPayload {
    /// Decodes a url-encoded form body. Unknown fields are ignored, missing
    /// fields are left empty.
    pub fn from_form(body: &[u8]) -> Self {
        let mut fields: HashMap<String, String> = url::form_urlencoded::parse(body)
            .into_owned()
            .collect();
        let mut take = |key: &str| fields.remove(key).unwrap_or_default();

        let command = take("command");
        let text = take("text");
        let channel_id = take("channel_id");
        Self {
            command,
            text,
            channel_id: (!channel_id.is_empty()).then_some(channel_id),
            channel_name: take("channel_name"),
            user_id: take("user_id"),
            team_id: take("team_id"),
        }
    }
}
