//! Process configuration, read once from the environment at startup.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use azure_devops::AzureDevOpsConfig;
use slack::SlackConfig;
use storage::DEFAULT_STORAGE_PATH;
use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:80";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack: SlackConfig,
    pub azure: AzureDevOpsConfig,
    /// Human channel name (`#builds`) of the default channel.
    pub slack_channel: Option<String>,
    pub storage_path: PathBuf,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::Missing(name));

        let timeout = match get("CI_REQUEST_TIMEOUT_SECS") {
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "CI_REQUEST_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    })
                }
            },
        };

        let listen_raw = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw
            .trim()
            .parse()
            .map_err(|err: std::net::AddrParseError| ConfigError::Invalid {
                name: "LISTEN_ADDR",
                value: listen_raw.clone(),
                reason: err.to_string(),
            })?;

        let mut slack = SlackConfig::new(require("SLACK_BOT_TOKEN")?).with_timeout(timeout);
        if let Some(secret) = get("SLACK_SIGNING_SECRET") {
            slack = slack.with_signing_secret(secret);
        }

        let organization = require("AZURE_ORG")?;
        let mut azure = AzureDevOpsConfig::new(
            &organization,
            require("AZURE_PROJECT_ID")?,
            require("AZURE_PAT")?,
        )
        .with_timeout(timeout);
        if let Some(base_url) = get("AZURE_BASE_URL") {
            azure = azure.with_base_url(base_url);
        }

        Ok(Self {
            slack,
            azure,
            slack_channel: get("SLACK_CHANNEL"),
            storage_path: get("PIPELINE_STORAGE_PATH")
                .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string())
                .into(),
            listen_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |name: &str| map.get(name).map(|value| value.to_string())
    }

    const REQUIRED: [(&str, &str); 4] = [
        ("SLACK_BOT_TOKEN", "xoxb-token"),
        ("AZURE_ORG", "contoso"),
        ("AZURE_PROJECT_ID", "proj-guid"),
        ("AZURE_PAT", "pat-secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_vars_are_unset() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:80".parse().unwrap());
        assert_eq!(config.storage_path, PathBuf::from("monitored_pipelines.json"));
        assert_eq!(config.slack_channel, None);
        assert_eq!(config.slack.signing_secret(), None);
        assert_eq!(config.slack.timeout(), Duration::from_secs(5));
        assert_eq!(config.azure.base_url(), "https://contoso.visualstudio.com");
    }

    #[test]
    fn optional_vars_override_defaults() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("SLACK_SIGNING_SECRET", "signing"),
            ("SLACK_CHANNEL", "#builds"),
            ("AZURE_BASE_URL", "https://dev.azure.com/contoso/"),
            ("PIPELINE_STORAGE_PATH", "/data/registry.json"),
            ("LISTEN_ADDR", "127.0.0.1:3000"),
            ("CI_REQUEST_TIMEOUT_SECS", "12"),
        ]);
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.slack.signing_secret(), Some("signing"));
        assert_eq!(config.slack_channel.as_deref(), Some("#builds"));
        assert_eq!(config.azure.base_url(), "https://dev.azure.com/contoso");
        assert_eq!(config.storage_path, PathBuf::from("/data/registry.json"));
        assert_eq!(config.listen_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.slack.timeout(), Duration::from_secs(12));
    }

    #[test]
    fn missing_required_var_is_named() {
        let vars: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(name, _)| *name != "AZURE_PAT")
            .collect();
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AZURE_PAT")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("SLACK_SIGNING_SECRET", "  "));
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.slack.signing_secret(), None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("CI_REQUEST_TIMEOUT_SECS", "soon"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Invalid { name: "CI_REQUEST_TIMEOUT_SECS", .. }
        ));

        let mut vars = REQUIRED.to_vec();
        vars.push(("LISTEN_ADDR", "port eighty"));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&vars)).unwrap_err(),
            ConfigError::Invalid { name: "LISTEN_ADDR", .. }
        ));
    }
}
