//! JSON-file token store.
//!
//! On-disk record: `{"access_token": .., "refresh_token": .., "expires_at": <unix seconds>}`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::TokenStore;
use crate::error::SyncError;
use crate::oauth::TokenSet;

/// Token store backed by a single JSON file.
pub struct FileTokenStore {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<f64>,
}

impl TokenRecord {
    fn into_token_set(self) -> Option<TokenSet> {
        let access_token = self.access_token.filter(|t| !t.is_empty())?;
        // A record without an expiry is treated as already expired
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp_millis((secs * 1000.0) as i64))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        Some(TokenSet {
            access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            expires_at,
        })
    }
}

impl From<&TokenSet> for TokenRecord {
    fn from(tokens: &TokenSet) -> Self {
        Self {
            access_token: Some(tokens.access_token.clone()),
            refresh_token: Some(tokens.refresh_token.clone()),
            expires_at: Some(tokens.expires_at.timestamp_millis() as f64 / 1000.0),
        }
    }
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, SyncError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SyncError::TokenStore(format!(
                    "Failed to load tokens from {}: {e}",
                    self.path.display()
                )))
            }
        };

        let record: TokenRecord = serde_json::from_str(&raw).map_err(|e| {
            SyncError::TokenStore(format!("Failed to parse {}: {e}", self.path.display()))
        })?;

        Ok(record.into_token_set())
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), SyncError> {
        let body = serde_json::to_vec(&TokenRecord::from(tokens))
            .map_err(|e| SyncError::TokenStore(format!("Failed to encode tokens: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::TokenStore(format!("Failed to create {}: {e}", parent.display())))?;
        }

        // Write-then-rename so readers never observe a half-written record
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| SyncError::TokenStore(format!("Failed to save tokens: {e}")))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SyncError::TokenStore(format!("Failed to save tokens: {e}")))?;

        debug!(path = %self.path.display(), "tokens saved");
        Ok(())
    }
}
