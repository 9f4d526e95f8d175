use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::error::SyncError;

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// The credential pair the sync runs on, with an absolute expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenSet {
    /// Stamp a provider grant with its absolute expiry, `issued_at + expires_in`.
    ///
    /// Returns `None` when the lifetime does not fit in a timestamp.
    pub fn from_grant(grant: TokenGrant, issued_at: DateTime<Utc>) -> Option<Self> {
        let lifetime = grant.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        let lifetime = Duration::try_seconds(i64::try_from(lifetime).ok()?)?;
        Some(Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at: issued_at.checked_add_signed(lifetime)?,
        })
    }

    /// A token set without an access token counts as absent.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Tokens as returned by the token endpoint, before expiry stamping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: Option<u64>,
}

/// OAuth client registration used on every token endpoint call.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// An OAuth2 authorization server for the accounting platform.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Unique provider identifier (e.g., "quickbooks").
    fn id(&self) -> &str;

    /// Build the authorization URL that the user should be redirected to.
    fn auth_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
        state: &str,
    ) -> Result<String, SyncError>;

    /// Exchange an authorization code for an access/refresh token pair.
    async fn exchange_code(
        &self,
        code: &str,
        client: &ClientCredentials,
        redirect_uri: &str,
    ) -> Result<TokenGrant, SyncError>;

    /// Trade a refresh token for a new token pair.
    async fn refresh_token(
        &self,
        refresh_token: &str,
        client: &ClientCredentials,
    ) -> Result<TokenGrant, SyncError>;
}
