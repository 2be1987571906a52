//! IPFS HTTP API store
//!
//! Reads DAG nodes through `POST /api/v0/dag/get?arg=<cid>`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::ContentStore;
use crate::config::StoreConfig;
use crate::error::{FetchError, VerifierError, VerifierResult};

/// Error body returned by the IPFS HTTP API
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "Message", default)]
    message: String,
}

/// Content store backed by an IPFS node
pub struct IpfsHttpStore {
    /// HTTP client
    client: Client,
    /// Normalized base URL
    base_url: String,
}

impl IpfsHttpStore {
    /// Create a store for the configured address
    pub fn new(config: &StoreConfig) -> VerifierResult<Self> {
        Self::with_timeout(&config.base_url()?, config.timeout())
    }

    /// Create a store for an already normalized base URL
    pub fn with_timeout(base_url: &str, timeout: Duration) -> VerifierResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifierError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn dag_get_url(&self) -> String {
        format!("{}/api/v0/dag/get", self.base_url)
    }
}

fn is_not_found(message: &str) -> bool {
    message.to_lowercase().contains("not found")
}

#[async_trait]
impl ContentStore for IpfsHttpStore {
    async fn get(&self, cid: &str) -> Result<Vec<u8>, FetchError> {
        debug!(cid, "IPFS dag get");

        let response = self
            .client
            .post(self.dag_get_url())
            .query(&[("arg", cid)])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(cid.to_string()));
        }

        let message = serde_json::from_slice::<ApiError>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());

        if is_not_found(&message) {
            Err(FetchError::NotFound(cid.to_string()))
        } else {
            Err(FetchError::Transport(format!("HTTP {} - {}", status, message)))
        }
    }

    fn name(&self) -> &str {
        "ipfs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer) -> IpfsHttpStore {
        IpfsHttpStore::with_timeout(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_dag_get() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/dag/get"))
            .and(query_param("arg", "bafyhead"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"height":3}"#))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert_eq!(store.get("bafyhead").await.unwrap(), br#"{"height":3}"#);
    }

    #[tokio::test]
    async fn test_not_found_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v0/dag/get"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "Message": "block was not found locally (offline)",
                "Code": 0,
                "Type": "error"
            })))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert_eq!(
            store.get("bafymissing").await,
            Err(FetchError::NotFound("bafymissing".to_string()))
        );
    }

    #[tokio::test]
    async fn test_server_error_is_transport() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert!(matches!(
            store.get("bafyx").await,
            Err(FetchError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_is_transport() {
        let store =
            IpfsHttpStore::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(matches!(
            store.get("bafyx").await,
            Err(FetchError::Transport(_))
        ));
    }

    #[test]
    fn test_base_url_from_multiaddr() {
        let config = StoreConfig {
            url: "/dns/ipfs/tcp/5001/".to_string(),
            ..Default::default()
        };
        assert!(IpfsHttpStore::new(&config).is_err());

        let config = StoreConfig::default();
        let store = IpfsHttpStore::new(&config).unwrap();
        assert_eq!(store.base_url(), "http://ipfs:5001");
    }
}
