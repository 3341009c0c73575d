//! pipewatch Azure DevOps adapter.
//!
//! Implements [`pipeline::CiStatusClient`] against the build-definitions REST
//! API (`_apis/build/definitions/{id}`, api-version 6.0).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Authentication, URL layout, timeouts, and mapping HTTP
//! outcomes to [`pipeline::CiError`] live here. The [`pipeline`] crate sees only
//! [`pipeline::CiStatusClient`].
//!
//! ## Updating a definition
//!
//! The API only accepts a complete definition on `PUT`, so
//! [`AzureDevOpsClient::set_status`] reads the current definition, replaces its
//! `queueStatus`, and writes the whole document back.

use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    CiError, CiStatusClient, PipelineDefinition, PipelineId, QueueStatus, StatusIndicator,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

const API_VERSION: &str = "6.0";

/// Connection settings for one Azure DevOps project.
#[derive(Clone)]
pub struct AzureDevOpsConfig {
    base_url: String,
    project_id: String,
    pat: SecretString,
    timeout: Duration,
}

impl std::fmt::Debug for AzureDevOpsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureDevOpsConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("pat", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl AzureDevOpsConfig {
    /// Settings for `https://{organization}.visualstudio.com/{project_id}`.
    pub fn new(
        organization: &str,
        project_id: impl Into<String>,
        pat: impl Into<String>,
    ) -> Self {
        Self {
            base_url: format!("https://{organization}.visualstudio.com"),
            project_id: project_id.into(),
            pat: SecretString::from(pat.into()),
            timeout: Duration::from_secs(5),
        }
    }

    /// Overrides the organisation URL (e.g. `https://dev.azure.com/{org}`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Per-request timeout for every API call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// The fields of a build definition this client reads.
#[derive(Debug, Deserialize)]
struct DefinitionSummary {
    name: String,
    #[serde(rename = "queueStatus")]
    queue_status: Value,
}

/// Extracts the status string. Older API versions send the enum ordinal.
fn queue_status_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match n.as_u64() {
            Some(0) => "enabled".to_string(),
            Some(1) => "paused".to_string(),
            Some(2) => "disabled".to_string(),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn transport_indicator(err: &reqwest::Error) -> StatusIndicator {
    if err.is_timeout() {
        StatusIndicator::Timeout
    } else {
        StatusIndicator::Unavailable
    }
}

/// [`CiStatusClient`] for Azure DevOps pipelines.
#[derive(Debug, Clone)]
pub struct AzureDevOpsClient {
    http: reqwest::Client,
    config: AzureDevOpsConfig,
}

impl AzureDevOpsClient {
    pub fn new(config: AzureDevOpsConfig) -> reqwest::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    fn definition_url(&self, pipeline_id: PipelineId) -> String {
        format!(
            "{}/{}/_apis/build/definitions/{}?api-version={}",
            self.config.base_url, self.config.project_id, pipeline_id, API_VERSION
        )
    }

    /// GETs the full definition document.
    async fn get_definition(&self, pipeline_id: PipelineId) -> Result<Value, StatusIndicator> {
        let url = self.definition_url(pipeline_id);
        debug!(%pipeline_id, %url, "fetching build definition");

        let response = self
            .http
            .get(&url)
            .basic_auth("", Some(self.config.pat.expose_secret()))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|err| transport_indicator(&err))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%pipeline_id, status = status.as_u16(), "build definition request failed");
            return Err(StatusIndicator::Http(status.as_u16()));
        }
        response
            .json::<Value>()
            .await
            .map_err(|err| transport_indicator(&err))
    }
}

#[async_trait]
impl CiStatusClient for AzureDevOpsClient {
    async fn fetch_definition(
        &self,
        pipeline_id: PipelineId,
    ) -> Result<PipelineDefinition, CiError> {
        let failed = |indicator| CiError::FetchFailed {
            pipeline_id,
            indicator,
        };

        let document = self.get_definition(pipeline_id).await.map_err(failed)?;
        let summary: DefinitionSummary = serde_json::from_value(document).map_err(|err| {
            warn!(%pipeline_id, error = %err, "unexpected build definition payload");
            failed(StatusIndicator::Unavailable)
        })?;

        Ok(PipelineDefinition {
            id: pipeline_id,
            name: summary.name,
            queue_status: queue_status_text(&summary.queue_status),
        })
    }

    async fn set_status(
        &self,
        pipeline_id: PipelineId,
        desired: QueueStatus,
    ) -> Result<String, CiError> {
        let mut document =
            self.get_definition(pipeline_id)
                .await
                .map_err(|indicator| CiError::FetchForUpdateFailed {
                    pipeline_id,
                    indicator,
                })?;
        let Some(fields) = document.as_object_mut() else {
            warn!(%pipeline_id, "build definition is not a JSON object");
            return Err(CiError::FetchForUpdateFailed {
                pipeline_id,
                indicator: StatusIndicator::Unavailable,
            });
        };
        let name = fields
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| pipeline_id.to_string());
        fields.insert(
            "queueStatus".to_string(),
            Value::String(desired.as_str().to_string()),
        );

        let update_failed = |indicator| CiError::UpdateFailed {
            pipeline_id,
            indicator,
        };
        let response = self
            .http
            .put(self.definition_url(pipeline_id))
            .basic_auth("", Some(self.config.pat.expose_secret()))
            .json(&document)
            .send()
            .await
            .map_err(|err| update_failed(transport_indicator(&err)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%pipeline_id, status = status.as_u16(), "build definition update failed");
            return Err(update_failed(StatusIndicator::Http(status.as_u16())));
        }

        debug!(%pipeline_id, %desired, "queue status updated");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use pipeline::PipelineStatus;

    use super::*;
    use wiremock::{
        matchers::{body_partial_json, header_exists, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const DEFINITION_PATH: &str = "/proj-guid/_apis/build/definitions/42";

    fn client_for(server: &MockServer) -> AzureDevOpsClient {
        let config = AzureDevOpsConfig::new("contoso", "proj-guid", "secret-pat")
            .with_base_url(server.uri());
        AzureDevOpsClient::new(config).unwrap()
    }

    fn definition(status: Value) -> Value {
        serde_json::json!({
            "id": 42,
            "name": "Build",
            "queueStatus": status,
            "revision": 7,
            "process": {"yamlFilename": "azure-pipelines.yml"}
        })
    }

    #[tokio::test]
    async fn fetch_status_reads_name_and_queue_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .and(query_param("api-version", "6.0"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(definition("paused".into())))
            .mount(&server)
            .await;

        let status = client_for(&server)
            .fetch_status(PipelineId::new(42))
            .await
            .unwrap();
        assert_eq!(
            status,
            PipelineStatus {
                id: PipelineId::new(42),
                name: "Build".to_string(),
                status: QueueStatus::Paused,
            }
        );
    }

    #[tokio::test]
    async fn fetch_status_accepts_numeric_queue_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(definition(2.into())))
            .mount(&server)
            .await;

        let status = client_for(&server)
            .fetch_status(PipelineId::new(42))
            .await
            .unwrap();
        assert_eq!(status.status, QueueStatus::Disabled);
    }

    #[tokio::test]
    async fn fetch_status_maps_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_status(PipelineId::new(42))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Could not fetch pipeline 42. Status code: 404"
        );
    }

    #[tokio::test]
    async fn fetch_status_reports_unknown_status_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(definition("frozen".into())))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_status(PipelineId::new(42))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CiError::UnknownStatus {
                pipeline_id: PipelineId::new(42),
                value: "frozen".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn definition_keeps_name_when_status_is_unrecognised() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(definition("frozen".into())))
            .mount(&server)
            .await;

        let definition = client_for(&server)
            .fetch_definition(PipelineId::new(42))
            .await
            .unwrap();
        assert_eq!(
            definition,
            PipelineDefinition {
                id: PipelineId::new(42),
                name: "Build".to_string(),
                queue_status: "frozen".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn fetch_status_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(definition("enabled".into()))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let config = AzureDevOpsConfig::new("contoso", "proj-guid", "pat")
            .with_base_url(server.uri())
            .with_timeout(Duration::from_millis(50));
        let err = AzureDevOpsClient::new(config)
            .unwrap()
            .fetch_status(PipelineId::new(42))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CiError::FetchFailed {
                pipeline_id: PipelineId::new(42),
                indicator: StatusIndicator::Timeout,
            }
        );
    }

    #[tokio::test]
    async fn set_status_puts_whole_definition_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(definition("enabled".into())))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(DEFINITION_PATH))
            .and(body_partial_json(serde_json::json!({
                "queueStatus": "paused",
                "revision": 7,
                "process": {"yamlFilename": "azure-pipelines.yml"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(definition("paused".into())))
            .expect(1)
            .mount(&server)
            .await;

        let name = client_for(&server)
            .set_status(PipelineId::new(42), QueueStatus::Paused)
            .await
            .unwrap();
        assert_eq!(name, "Build");
    }

    #[tokio::test]
    async fn set_status_distinguishes_read_and_write_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DEFINITION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(definition("enabled".into())))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(DEFINITION_PATH))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .set_status(PipelineId::new(42), QueueStatus::Paused)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Failed to update pipeline 42. Status code: 409"
        );

        let err = client_for(&server)
            .set_status(PipelineId::new(43), QueueStatus::Paused)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error: Could not fetch pipeline 43 for update. Status code: 404"
        );
    }

    #[test]
    fn config_debug_redacts_pat() {
        let config = AzureDevOpsConfig::new("contoso", "proj", "super-secret");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("https://contoso.visualstudio.com"));
    }
}
