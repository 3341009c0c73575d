//! pipewatch slash-command listener.
//!
//! An axum server exposing:
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /slack/events/pipeline-status` | Slack slash command; replies with the dispatcher's JSON response |
//! | `GET /health` | Liveness probe, always `ok` |
//!
//! When a [`slack::SignatureVerifier`] is configured every slash command must
//! carry a valid `X-Slack-Signature`; failures are answered with `403`. Every
//! other outcome, including command errors, is a `200` with the error text in
//! the body so Slack shows it to the invoker.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Transport and request authentication live here. The
//! [`pipeline`] crate sees only the `(channel, text)` pair passed to
//! [`pipeline::CommandDispatcher::dispatch`].

mod routes;
mod server;

pub use routes::{router, ListenerState, HEALTH_PATH, SLASH_COMMAND_PATH};
pub use server::{serve, ListenerError};
