//! pipewatch Slack adapter.
//!
//! Everything that knows about Slack's wire formats lives here:
//!
//! - [`SlackChannelResolver`] implements [`pipeline::ChannelResolver`] by
//!   paging through `conversations.list`.
//! - [`SlashCommandPayload`] decodes the form body of a slash command.
//! - [`SignatureVerifier`] checks the `X-Slack-Signature` header (v0 scheme).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The [`pipeline`] crate sees only
//! [`pipeline::ChannelResolver`]; the HTTP endpoint in `listener` uses the
//! payload and verifier types directly.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`config`] | Tokens, API base URL, and timeout |
//! | [`error`] | [`SlackError`] |
//! | [`channels`] | Channel-name lookup |
//! | [`commands`] | Slash command payload decoding |
//! | [`signature`] | Request signature verification |

pub mod channels;
pub mod commands;
pub mod config;
pub mod error;
pub mod signature;

pub use channels::SlackChannelResolver;
pub use commands::SlashCommandPayload;
pub use config::SlackConfig;
pub use error::{SlackError, SlackResult};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER};
