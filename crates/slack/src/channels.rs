//! Channel name resolution via `conversations.list`.

use async_trait::async_trait;
use pipeline::{ChannelId, ChannelResolver, ResolveError};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    config::SlackConfig,
    error::{SlackError, SlackResult},
};

const PAGE_SIZE: &str = "200";

#[derive(Debug, Deserialize)]
struct ConversationsListResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Vec<Conversation>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct Conversation {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

/// [`ChannelResolver`] backed by the Slack Web API.
#[derive(Debug, Clone)]
pub struct SlackChannelResolver {
    client: reqwest::Client,
    config: SlackConfig,
}

impl SlackChannelResolver {
    pub fn new(config: SlackConfig) -> SlackResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SlackError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Fetches one page of conversations.
    async fn list_page(&self, cursor: Option<&str>) -> SlackResult<ConversationsListResponse> {
        let url = format!("{}/conversations.list", self.config.api_base());
        let mut query = vec![("limit", PAGE_SIZE), ("exclude_archived", "true")];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.config.bot_token())
            .query(&query)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(30);
            return Err(SlackError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Api(format!("{}: {}", status, body)));
        }

        let page: ConversationsListResponse = response.json().await?;
        if !page.ok {
            return Err(SlackError::Api(
                page.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }
        Ok(page)
    }

    /// Walks every page until a channel called `name` is found.
    async fn find(&self, name: &str) -> SlackResult<Option<ChannelId>> {
        let mut cursor: Option<String> = None;
        loop {
            let page = self.list_page(cursor.as_deref()).await?;
            if let Some(found) = page.channels.iter().find(|c| c.name == name) {
                return Ok(ChannelId::new(found.id.clone()));
            }
            match page.response_metadata {
                Some(meta) if !meta.next_cursor.is_empty() => cursor = Some(meta.next_cursor),
                _ => return Ok(None),
            }
        }
    }
}

#[async_trait]
impl ChannelResolver for SlackChannelResolver {
    async fn resolve(&self, name: &str) -> Result<Option<ChannelId>, ResolveError> {
        let bare = name.trim_start_matches('#');
        match self.find(bare).await {
            Ok(found) => {
                debug!(name = bare, found = found.is_some(), "channel lookup finished");
                Ok(found)
            }
            Err(err) => {
                warn!(name = bare, error = %err, "channel lookup failed");
                Err(err.into())
            }
        }
    }
}
