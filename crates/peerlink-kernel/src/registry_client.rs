//! HTTP client for the registry service.
//!
//! Every call returns a typed [`ClientError`] on failure; network trouble is
//! never a panic. Requests are bounded by the configured request timeout.

use peerlink_types::config::PeerConfig;
use peerlink_types::{Message, PeerLinkError, PeerRecord};
use reqwest::{Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from registry requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The username is already registered.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The registry does not know the requested peer.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("Registry rejected request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Registry request timed out")]
    Timeout,

    /// Connection refused, DNS failure, and similar.
    #[error("Registry unreachable: {0}")]
    Unreachable(String),

    /// The response body was not what the registry should send.
    #[error("Invalid registry response: {0}")]
    Decode(String),

    /// Rejected locally, before any request was made.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClientError::Timeout
        } else if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Unreachable(e.to_string())
        }
    }
}

impl From<ClientError> for PeerLinkError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Conflict(d) => PeerLinkError::Conflict(d),
            ClientError::NotFound(d) => PeerLinkError::NotFound(d),
            ClientError::Timeout => PeerLinkError::Timeout("registry request".into()),
            ClientError::Unreachable(d) => PeerLinkError::ConnectFailed(d),
            ClientError::Decode(d) => PeerLinkError::Decode(d),
            ClientError::InvalidInput(d) => PeerLinkError::InvalidInput(d),
            other @ ClientError::Rejected { .. } => PeerLinkError::Internal(other.to_string()),
        }
    }
}

/// Async client for the registry's HTTP/JSON API.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(base_url: &str, request_timeout: Duration, connect_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn from_config(config: &PeerConfig) -> Self {
        Self::new(
            &config.registry_url,
            config.request_timeout(),
            config.connect_timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Register a full record.
    pub async fn register_by_record(&self, record: &PeerRecord) -> Result<PeerRecord, ClientError> {
        record
            .validate()
            .map_err(|e| ClientError::InvalidInput(e.to_string()))?;

        let resp = self
            .http
            .post(self.url("/register/"))
            .json(record)
            .send()
            .await?;

        match resp.status() {
            StatusCode::OK => {
                let stored = resp.json::<PeerRecord>().await?;
                info!(peer = %stored, "registered with registry");
                Ok(stored)
            }
            StatusCode::BAD_REQUEST => {
                let detail = detail_of(resp).await;
                if detail.contains("already exists") {
                    Err(ClientError::Conflict(detail))
                } else {
                    Err(ClientError::Rejected {
                        status: 400,
                        detail,
                    })
                }
            }
            _ => Err(rejected(resp).await),
        }
    }

    /// Register from individual fields.
    pub async fn register_by_fields(
        &self,
        username: &str,
        host: &str,
        port: u16,
    ) -> Result<PeerRecord, ClientError> {
        self.register_by_record(&PeerRecord::new(username, host, port))
            .await
    }

    /// Every registered peer.
    pub async fn list(&self) -> Result<Vec<PeerRecord>, ClientError> {
        let resp = self.http.get(self.url("/available/")).send().await?;
        if resp.status() != StatusCode::OK {
            return Err(rejected(resp).await);
        }
        Ok(resp.json::<Vec<PeerRecord>>().await?)
    }

    /// Like [`list`](Self::list), but an unreachable registry yields an empty list.
    pub async fn available(&self) -> Vec<PeerRecord> {
        match self.list().await {
            Ok(peers) => peers,
            Err(e) => {
                warn!(registry = %self.base_url, "failed to fetch peers: {e}");
                Vec::new()
            }
        }
    }

    pub async fn unregister(&self, username: &str) -> Result<(), ClientError> {
        let mut url = reqwest::Url::parse(&self.url("/unregister/"))
            .map_err(|e| ClientError::InvalidInput(format!("registry URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidInput("registry URL cannot be a base".into()))?
            .pop_if_empty()
            .push(username);

        let resp = self.http.delete(url).send().await?;
        match resp.status() {
            StatusCode::OK => {
                info!(username, "unregistered from registry");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(detail_of(resp).await)),
            _ => Err(rejected(resp).await),
        }
    }

    /// Current record for `username`.
    pub async fn resolve(&self, username: &str) -> Result<PeerRecord, ClientError> {
        self.list()
            .await?
            .into_iter()
            .find(|p| p.username == username)
            .ok_or_else(|| ClientError::NotFound(format!("User {username} not found")))
    }

    /// Ask the registry to forward `message` to its receiver.
    pub async fn relay(&self, message: &Message) -> Result<(), ClientError> {
        let resp = self
            .http
            .post(self.url("/send/"))
            .json(message)
            .send()
            .await?;
        match resp.status() {
            StatusCode::OK => {
                debug!(to = %message.receiver().username, "registry accepted relay");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(detail_of(resp).await)),
            _ => Err(rejected(resp).await),
        }
    }
}

/// The `detail` field of an error body, or the raw text.
async fn detail_of(resp: Response) -> String {
    let text = resp.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or(text)
}

async fn rejected(resp: Response) -> ClientError {
    let status = resp.status().as_u16();
    ClientError::Rejected {
        status,
        detail: detail_of(resp).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dead_registry() -> RegistryClient {
        // Nothing listens on a port we just released.
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = l.local_addr().unwrap().port();
        drop(l);
        RegistryClient::new(
            &format!("http://127.0.0.1:{port}/"),
            Duration::from_secs(2),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = RegistryClient::new(
            "http://127.0.0.1:8000/",
            Duration::from_secs(1),
            Duration::from_secs(1),
        );
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
        assert_eq!(client.url("/send/"), "http://127.0.0.1:8000/send/");
    }

    #[tokio::test]
    async fn test_invalid_fields_rejected_locally() {
        let client = dead_registry();
        let err = client
            .register_by_fields("alice", "127.0.0.1", 80)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_typed() {
        let client = dead_registry();
        let err = client.list().await.unwrap_err();
        assert!(matches!(err, ClientError::Unreachable(_) | ClientError::Timeout));
        assert!(client.available().await.is_empty());
    }

    #[test]
    fn test_client_error_maps_to_core_error() {
        assert!(matches!(
            PeerLinkError::from(ClientError::NotFound("bob".into())),
            PeerLinkError::NotFound(_)
        ));
        assert!(matches!(
            PeerLinkError::from(ClientError::Conflict("bob".into())),
            PeerLinkError::Conflict(_)
        ));
        assert!(matches!(
            PeerLinkError::from(ClientError::Timeout),
            PeerLinkError::Timeout(_)
        ));
    }
}
