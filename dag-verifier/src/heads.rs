//! Head Sources
//!
//! Resolve the CID a project's chain walk starts from.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::config::ProjectConfig;
use crate::error::{VerifierError, VerifierResult};

/// Resolves a project's current head CID
#[async_trait]
pub trait HeadSource: Send + Sync {
    /// Head CID, or `None` when the project has no chain yet
    async fn head_cid(&self, project_id: &str) -> VerifierResult<Option<String>>;

    /// Source name (for logging)
    fn name(&self) -> &str;
}

/// Fixed head CIDs from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticHeadSource {
    heads: HashMap<String, String>,
}

impl StaticHeadSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_projects(projects: &[ProjectConfig]) -> Self {
        let heads = projects
            .iter()
            .filter_map(|p| p.head_cid.as_ref().map(|cid| (p.id.clone(), cid.clone())))
            .collect();
        Self { heads }
    }

    pub fn with_head(mut self, project_id: &str, cid: &str) -> Self {
        self.set_head(project_id, cid);
        self
    }

    pub fn set_head(&mut self, project_id: &str, cid: &str) {
        self.heads.insert(project_id.to_string(), cid.to_string());
    }
}

#[async_trait]
impl HeadSource for StaticHeadSource {
    async fn head_cid(&self, project_id: &str) -> VerifierResult<Option<String>> {
        Ok(self.heads.get(project_id).cloned())
    }

    fn name(&self) -> &str {
        "static"
    }
}

#[derive(Debug, Deserialize)]
struct HeightResponse {
    height: i64,
}

/// Audit protocol HTTP API
///
/// `GET /{project}/payloads/height` gives the latest height and
/// `GET /{project}/payload/{height}` a single-key object mapping the DAG CID
/// at that height to its block.
pub struct ApiHeadSource {
    client: Client,
    base_url: String,
}

impl ApiHeadSource {
    pub fn new(base_url: &str, timeout: Duration) -> VerifierResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifierError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        project_id: &str,
        url: String,
    ) -> VerifierResult<T> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| VerifierError::head_source(project_id, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifierError::head_source(
                project_id,
                format!("HTTP {} - {}", status, body),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| VerifierError::head_source(project_id, e))
    }
}

#[async_trait]
impl HeadSource for ApiHeadSource {
    async fn head_cid(&self, project_id: &str) -> VerifierResult<Option<String>> {
        let latest: HeightResponse = self
            .get_json(
                project_id,
                format!("{}/{}/payloads/height", self.base_url, project_id),
            )
            .await?;

        if latest.height <= 0 {
            debug!(project_id, height = latest.height, "Project has no chain yet");
            return Ok(None);
        }

        let block: HashMap<String, serde_json::Value> = self
            .get_json(
                project_id,
                format!("{}/{}/payload/{}", self.base_url, project_id, latest.height),
            )
            .await?;

        if block.contains_key("error") {
            return Err(VerifierError::head_source(
                project_id,
                format!("no block at height {}", latest.height),
            ));
        }

        let mut cids = block.into_keys();
        match (cids.next(), cids.next()) {
            (Some(cid), None) => {
                debug!(project_id, height = latest.height, cid = %cid, "Resolved head");
                Ok(Some(cid))
            }
            _ => Err(VerifierError::head_source(
                project_id,
                "payload response must map exactly one CID",
            )),
        }
    }

    fn name(&self) -> &str {
        "api"
    }
}

/// Configured heads first, the API for the rest
pub struct LayeredHeadSource {
    fixed: StaticHeadSource,
    fallback: Option<Box<dyn HeadSource>>,
}

impl LayeredHeadSource {
    pub fn new(fixed: StaticHeadSource, fallback: Option<Box<dyn HeadSource>>) -> Self {
        Self { fixed, fallback }
    }
}

#[async_trait]
impl HeadSource for LayeredHeadSource {
    async fn head_cid(&self, project_id: &str) -> VerifierResult<Option<String>> {
        if let Some(cid) = self.fixed.head_cid(project_id).await? {
            return Ok(Some(cid));
        }
        match &self.fallback {
            Some(source) => source.head_cid(project_id).await,
            None => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "layered"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_static_source() {
        let projects = ProjectConfig::parse_list("a=bafyA,b");
        let source = StaticHeadSource::from_projects(&projects);

        assert_eq!(source.head_cid("a").await.unwrap(), Some("bafyA".to_string()));
        assert_eq!(source.head_cid("b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_source_resolves_head() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/42/payloads/height"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "height": 17 })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/42/payload/17"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bafyhead17": { "height": 17, "prevCid": "bafy16" }
            })))
            .mount(&server)
            .await;

        let source = ApiHeadSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(
            source.head_cid("42").await.unwrap(),
            Some("bafyhead17".to_string())
        );
    }

    #[tokio::test]
    async fn test_api_source_empty_chain() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/7/payloads/height"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "height": -1 })))
            .mount(&server)
            .await;

        let source = ApiHeadSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert_eq!(source.head_cid("7").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_source_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "Invalid Block Height" })))
            .mount(&server)
            .await;

        let source = ApiHeadSource::new(&server.uri(), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            source.head_cid("9").await,
            Err(VerifierError::HeadSource { .. })
        ));
    }

    #[tokio::test]
    async fn test_layered_prefers_fixed() {
        let fixed = StaticHeadSource::new().with_head("a", "bafyfixed");
        let fallback = StaticHeadSource::new().with_head("b", "bafyfallback");
        let source = LayeredHeadSource::new(fixed, Some(Box::new(fallback)));

        assert_eq!(source.head_cid("a").await.unwrap(), Some("bafyfixed".to_string()));
        assert_eq!(source.head_cid("b").await.unwrap(), Some("bafyfallback".to_string()));
        assert_eq!(source.head_cid("c").await.unwrap(), None);
    }
}
