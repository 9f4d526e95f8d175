//! Token lifecycle: authorization, code exchange, refresh and the
//! "valid token" accessor everything else goes through.

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::traits::{ClientCredentials, OAuthProvider, TokenSet};
use crate::clock::Clock;
use crate::crypto::StateSigner;
use crate::error::SyncError;
use crate::store::TokenStore;

/// Client registration and scope for one OAuth app.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client: ClientCredentials,
    pub redirect_uri: String,
    pub scope: String,
}

pub struct TokenManager {
    settings: OAuthSettings,
    provider: Arc<dyn OAuthProvider>,
    store: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    signer: StateSigner,
    // Held across refresh + persist; refresh tokens rotate on use
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(
        settings: OAuthSettings,
        provider: Arc<dyn OAuthProvider>,
        store: Arc<dyn TokenStore>,
        clock: Arc<dyn Clock>,
        signer: StateSigner,
    ) -> Self {
        Self {
            settings,
            provider,
            store,
            clock,
            signer,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Authorization URL with a freshly signed CSRF state.
    pub fn authorize(&self) -> Result<String, SyncError> {
        let state = self.signer.issue(self.clock.now())?;
        self.provider.auth_url(
            &self.settings.client.client_id,
            &self.settings.redirect_uri,
            &self.settings.scope,
            &state,
        )
    }

    /// Verify the state parameter echoed back on the callback.
    pub fn verify_state(&self, state: &str) -> Result<(), SyncError> {
        self.signer.verify(state, self.clock.now())
    }

    /// Exchange an authorization code. Does not persist.
    pub async fn exchange(&self, code: &str) -> Result<TokenSet, SyncError> {
        let grant = self
            .provider
            .exchange_code(code, &self.settings.client, &self.settings.redirect_uri)
            .await?;
        let lifetime = grant.expires_in;
        TokenSet::from_grant(grant, self.clock.now()).ok_or_else(|| {
            SyncError::AuthExchange(format!("Token lifetime out of range: {lifetime:?}"))
        })
    }

    /// Exchange an authorization code and persist the resulting pair.
    pub async fn exchange_and_store(&self, code: &str) -> Result<TokenSet, SyncError> {
        let _guard = self.refresh_lock.lock().await;
        let tokens = self.exchange(code).await?;
        self.store.save(&tokens).await?;
        info!(
            provider = self.provider.id(),
            expires_at = %tokens.expires_at,
            "Authorization code exchanged"
        );
        Ok(tokens)
    }

    /// Trade a refresh token for a new pair. Does not persist.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, SyncError> {
        let grant = self
            .provider
            .refresh_token(refresh_token, &self.settings.client)
            .await?;
        let lifetime = grant.expires_in;
        TokenSet::from_grant(grant, self.clock.now()).ok_or_else(|| {
            SyncError::AuthRefresh(format!("Token lifetime out of range: {lifetime:?}"))
        })
    }

    /// Return `stored` if still valid, otherwise refresh and persist.
    pub async fn ensure_valid(&self, stored: Option<TokenSet>) -> Result<TokenSet, SyncError> {
        let stored = match stored {
            Some(tokens) if !tokens.is_empty() => tokens,
            _ => return Err(SyncError::NotAuthenticated),
        };

        if !stored.is_expired_at(self.clock.now()) {
            return Ok(stored);
        }

        debug!(expires_at = %stored.expires_at, "Access token expired");
        self.rotate(&stored).await
    }

    /// Load the stored pair and make sure it is usable.
    pub async fn current(&self) -> Result<TokenSet, SyncError> {
        let stored = self.store.load().await?;
        self.ensure_valid(stored).await
    }

    /// Replace a token the API rejected. Refreshes unless a concurrent caller already did.
    pub async fn force_refresh(&self, rejected: &TokenSet) -> Result<TokenSet, SyncError> {
        self.rotate(rejected).await
    }

    /// Refresh ahead of expiry. Returns whether a refresh happened.
    pub async fn refresh_if_expiring(&self, lead: Duration) -> Result<bool, SyncError> {
        let stored = match self.store.load().await? {
            Some(tokens) => tokens,
            None => return Ok(false),
        };

        if !stored.is_expired_at(self.clock.now() + lead) {
            return Ok(false);
        }

        self.rotate(&stored).await?;
        Ok(true)
    }

    async fn rotate(&self, stale: &TokenSet) -> Result<TokenSet, SyncError> {
        let _guard = self.refresh_lock.lock().await;

        let basis = match self.store.load().await? {
            Some(latest) if latest.access_token != stale.access_token => {
                if !latest.is_expired_at(self.clock.now()) {
                    debug!("Token already rotated by a concurrent caller");
                    return Ok(latest);
                }
                latest
            }
            _ => stale.clone(),
        };

        let refreshed = self.refresh(&basis.refresh_token).await?;
        self.store.save(&refreshed).await?;
        info!(
            provider = self.provider.id(),
            expires_at = %refreshed.expires_at,
            "Access token refreshed"
        );
        Ok(refreshed)
    }
}
