use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::debug;

use super::traits::{ClientCredentials, OAuthProvider, TokenGrant};
use crate::error::SyncError;

pub const QUICKBOOKS_AUTH_URL: &str = "https://appcenter.intuit.com/connect/oauth2";
pub const QUICKBOOKS_TOKEN_URL: &str = "https://oauth.platform.intuit.com/oauth2/v1/tokens/bearer";
pub const QUICKBOOKS_ACCOUNTING_SCOPE: &str = "com.intuit.quickbooks.accounting";

/// Intuit (QuickBooks Online) OAuth 2.0 provider.
///
/// Quirks:
/// - Token endpoint requires Basic auth (client_id:client_secret base64).
/// - Refresh tokens rotate on use; the previous one stops working once the
///   new pair has been issued.
/// - A response counts as a grant when it carries both `access_token` and
///   `refresh_token`, whatever the HTTP status.
pub struct QuickBooksProvider {
    auth_endpoint: String,
    token_endpoint: String,
    http: reqwest::Client,
}

// Raw token response; every field optional so presence can be checked
#[derive(Debug, Deserialize)]
struct QuickBooksTokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

impl QuickBooksProvider {
    pub fn new() -> Self {
        Self::with_endpoints(QUICKBOOKS_AUTH_URL, QUICKBOOKS_TOKEN_URL)
    }

    pub fn with_endpoints(auth_endpoint: impl Into<String>, token_endpoint: impl Into<String>) -> Self {
        Self {
            auth_endpoint: auth_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    async fn post_token_form(
        &self,
        client: &ClientCredentials,
        form: &[(&str, &str)],
    ) -> Result<String, String> {
        let resp = self
            .http
            .post(&self.token_endpoint)
            .basic_auth(&client.client_id, Some(&client.client_secret))
            .header(ACCEPT, "application/json")
            .form(form)
            .send()
            .await
            .map_err(|e| format!("token request failed: {e}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("failed to read token response: {e}"))?;
        debug!(%status, "token endpoint responded");

        Ok(body)
    }
}

impl Default for QuickBooksProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OAuthProvider for QuickBooksProvider {
    fn id(&self) -> &str {
        "quickbooks"
    }

    fn auth_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
        state: &str,
    ) -> Result<String, SyncError> {
        if client_id.is_empty() {
            return Err(SyncError::Config("client_id must not be empty".into()));
        }
        if redirect_uri.is_empty() {
            return Err(SyncError::Config("redirect_uri must not be empty".into()));
        }

        let mut url = url::Url::parse(&self.auth_endpoint)
            .map_err(|e| SyncError::Config(format!("Invalid authorization endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("scope", scope)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("state", state);

        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        code: &str,
        client: &ClientCredentials,
        redirect_uri: &str,
    ) -> Result<TokenGrant, SyncError> {
        let body = self
            .post_token_form(
                client,
                &[
                    ("grant_type", "authorization_code"),
                    ("code", code),
                    ("redirect_uri", redirect_uri),
                ],
            )
            .await
            .map_err(SyncError::AuthExchange)?;

        parse_grant(&body).ok_or_else(|| SyncError::AuthExchange(body))
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        client: &ClientCredentials,
    ) -> Result<TokenGrant, SyncError> {
        let body = self
            .post_token_form(
                client,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
            )
            .await
            .map_err(SyncError::AuthRefresh)?;

        parse_grant(&body).ok_or_else(|| SyncError::AuthRefresh(body))
    }
}

/// Extract a grant from a token endpoint body, or `None` if either token is missing.
pub(crate) fn parse_grant(body: &str) -> Option<TokenGrant> {
    let resp: QuickBooksTokenResponse = serde_json::from_str(body).ok()?;
    match (resp.access_token, resp.refresh_token) {
        (Some(access_token), Some(refresh_token)) => Some(TokenGrant {
            access_token,
            refresh_token,
            expires_in: resp.expires_in,
        }),
        _ => None,
    }
}
