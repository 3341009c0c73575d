//! Configuration for the Slack adapter.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Credentials and endpoints for the Slack Web API.
#[derive(Clone)]
pub struct SlackConfig {
    /// Bot OAuth token (xoxb-...).
    bot_token: SecretString,
    /// Signing secret for request verification. `None` disables verification.
    signing_secret: Option<SecretString>,
    /// Web API base URL, without trailing slash.
    api_base: String,
    /// Per-request timeout for Web API calls.
    timeout: Duration,
}

impl std::fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackConfig")
            .field("bot_token", &"[REDACTED]")
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SlackConfig {
    pub fn new(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: SecretString::from(bot_token.into()),
            signing_secret: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_signing_secret(mut self, signing_secret: impl Into<String>) -> Self {
        self.signing_secret = Some(SecretString::from(signing_secret.into()));
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }

    pub fn signing_secret(&self) -> Option<&str> {
        self.signing_secret.as_ref().map(|s| s.expose_secret())
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
