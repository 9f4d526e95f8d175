use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::SyncError;

/// Status and raw body of one GET.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

/// Issues a single authenticated GET. No retries at this layer.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, access_token: &str) -> Result<Reply, SyncError>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, access_token: &str) -> Result<Reply, SyncError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::Transport(format!("Failed to read body of {url}: {e}")))?;

        Ok(Reply { status, body })
    }
}
