//! Slash-command grammar.
//!
//! ```text
//! add <pipelineId>
//! delete <pipelineId>
//! list
//! [toggle] <id> [<id> ...]
//! (no arguments)
//! ```
//!
//! Command words are matched case-insensitively on the first token and, when
//! they match, consume the whole token stream under their own grammar. Only
//! otherwise is the input read as a status query.

use thiserror::Error;

use crate::PipelineId;

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// No tokens were given; answer with usage help.
    Help,
    Add(PipelineId),
    Delete(PipelineId),
    List,
    /// Report live status for each id, flipping each one when `toggle` is set.
    Status {
        /// In input order; duplicates are kept.
        pipeline_ids: Vec<PipelineId>,
        toggle: bool,
    },
}

/// Malformed command text. The message is a usage hint for the invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidArguments {
    #[error("Please provide a valid pipeline ID (e.g., /pipeline-status add 123)")]
    Add,
    #[error("Please provide a valid pipeline ID (e.g., /pipeline-status delete 123)")]
    Delete,
    #[error("Please provide valid pipeline IDs (e.g., /pipeline-status [toggle] 123)")]
    Status,
}

impl Command {
    /// Parses whitespace-separated command text.
    pub fn from_text(text: &str) -> Result<Self, InvalidArguments> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        Self::parse(&tokens)
    }

    /// Parses an already tokenised command.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self, InvalidArguments> {
        let Some(first) = tokens.first().map(token_str) else {
            return Ok(Self::Help);
        };
        let operand = tokens
            .get(1)
            .and_then(|token| PipelineId::parse_literal(token_str(token)));

        if first.eq_ignore_ascii_case("add") {
            return operand.map(Self::Add).ok_or(InvalidArguments::Add);
        }
        if first.eq_ignore_ascii_case("delete") {
            return operand.map(Self::Delete).ok_or(InvalidArguments::Delete);
        }
        if first.eq_ignore_ascii_case("list") {
            return Ok(Self::List);
        }

        let pipeline_ids: Vec<PipelineId> = tokens
            .iter()
            .filter_map(|token| PipelineId::parse_literal(token_str(token)))
            .collect();
        if pipeline_ids.is_empty() {
            return Err(InvalidArguments::Status);
        }
        let toggle = tokens
            .iter()
            .any(|token| token_str(token).eq_ignore_ascii_case("toggle"));
        Ok(Self::Status {
            pipeline_ids,
            toggle,
        })
    }

    /// Short name for logs and spans.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Add(_) => "add",
            Self::Delete(_) => "delete",
            Self::List => "list",
            Self::Status { toggle: false, .. } => "status",
            Self::Status { toggle: true, .. } => "toggle",
        }
    }
}

fn token_str<S: AsRef<str>>(token: &S) -> &str {
    token.as_ref()
}
