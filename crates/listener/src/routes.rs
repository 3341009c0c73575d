//! HTTP routes.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pipeline::{ChannelId, CommandDispatcher};
use slack::{SignatureVerifier, SlashCommandPayload, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use tracing::{debug, warn};

pub const SLASH_COMMAND_PATH: &str = "/slack/events/pipeline-status";
pub const HEALTH_PATH: &str = "/health";

/// Shared state for every request.
pub struct ListenerState {
    pub dispatcher: Arc<CommandDispatcher>,
    /// `None` disables signature verification.
    pub verifier: Option<SignatureVerifier>,
    /// Channel used when a payload carries no `channel_id`.
    pub default_channel: ChannelId,
}

pub fn router(state: Arc<ListenerState>) -> Router {
    Router::new()
        .route(SLASH_COMMAND_PATH, post(slash_command))
        .route(HEALTH_PATH, get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn slash_command(
    State(state): State<Arc<ListenerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(verifier) = &state.verifier {
        let timestamp = header_str(&headers, TIMESTAMP_HEADER);
        let signature = header_str(&headers, SIGNATURE_HEADER);
        if let Err(err) = verifier.verify(timestamp, signature, &body) {
            warn!(error = %err, "rejected slash command");
            return (StatusCode::FORBIDDEN, "Invalid request").into_response();
        }
    }

    let payload = SlashCommandPayload::from_form(&body);
    let channel = payload
        .channel_id
        .and_then(ChannelId::new)
        .unwrap_or_else(|| state.default_channel.clone());
    debug!(%channel, command = %payload.command, "slash command received");

    let reply = state.dispatcher.dispatch(&channel, &payload.text).await;
    (StatusCode::OK, Json(reply)).into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
