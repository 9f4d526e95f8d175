use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

use crate::client::RetryPolicy;
use crate::oauth::{
    ClientCredentials, OAuthSettings, QUICKBOOKS_ACCOUNTING_SCOPE, QUICKBOOKS_AUTH_URL,
    QUICKBOOKS_TOKEN_URL,
};

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // ── Server ──────────────────────────────────────────────────────────
    pub host: String,
    pub port: u16,

    // ── OAuth app ───────────────────────────────────────────────────────
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    /// 32-byte base64-encoded HMAC key for state parameter signing.
    pub state_secret: String,

    // ── Accounting API ──────────────────────────────────────────────────
    pub api_base_url: String,
    /// QuickBooks realm the reports are read from
    pub company_id: String,
    pub retry_max_attempts: u32,
    pub retry_initial_backoff: Duration,

    // ── Storage ─────────────────────────────────────────────────────────
    pub token_file: PathBuf,
    pub database_url: String,
    pub ledger_table: String,

    // ── Refresh daemon ──────────────────────────────────────────────────
    pub refresh_interval: Duration,
    pub refresh_lead: chrono::Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8000".into())
                .parse()
                .context("Invalid PORT")?,

            client_id: std::env::var("CLIENT_ID").context("CLIENT_ID is required")?,
            client_secret: std::env::var("CLIENT_SECRET").context("CLIENT_SECRET is required")?,
            redirect_uri: std::env::var("REDIRECT_URI").context("REDIRECT_URI is required")?,
            auth_url: std::env::var("AUTH_URL").unwrap_or_else(|_| QUICKBOOKS_AUTH_URL.into()),
            token_url: std::env::var("TOKEN_URL").unwrap_or_else(|_| QUICKBOOKS_TOKEN_URL.into()),
            state_secret: std::env::var("STATE_SECRET")
                .context("STATE_SECRET is required (32 bytes, base64)")?,

            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "https://quickbooks.api.intuit.com".into()),
            company_id: std::env::var("COMPANY_ID").context("COMPANY_ID is required")?,
            retry_max_attempts: std::env::var("RETRY_MAX_ATTEMPTS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .context("Invalid RETRY_MAX_ATTEMPTS")?,
            retry_initial_backoff: Duration::from_millis(
                std::env::var("RETRY_INITIAL_BACKOFF_MS")
                    .unwrap_or_else(|_| "1000".into())
                    .parse()
                    .context("Invalid RETRY_INITIAL_BACKOFF_MS")?,
            ),

            token_file: std::env::var("TOKEN_FILE")
                .unwrap_or_else(|_| "token.json".into())
                .into(),
            database_url: std::env::var("DATABASE_URL")
                .context("DATABASE_URL is required (PostgreSQL connection string)")?,
            ledger_table: std::env::var("LEDGER_TABLE")
                .unwrap_or_else(|_| "balance_deltas".into()),

            refresh_interval: Duration::from_secs(
                std::env::var("REFRESH_INTERVAL_SECS")
                    .unwrap_or_else(|_| "300".into())
                    .parse()
                    .context("Invalid REFRESH_INTERVAL_SECS")?,
            ),
            refresh_lead: chrono::Duration::seconds(
                std::env::var("REFRESH_LEAD_SECS")
                    .unwrap_or_else(|_| "600".into())
                    .parse()
                    .context("Invalid REFRESH_LEAD_SECS")?,
            ),
        })
    }

    pub fn oauth_settings(&self) -> OAuthSettings {
        OAuthSettings {
            client: ClientCredentials {
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
            },
            redirect_uri: self.redirect_uri.clone(),
            scope: QUICKBOOKS_ACCOUNTING_SCOPE.into(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            initial_backoff: self.retry_initial_backoff,
            ..RetryPolicy::default()
        }
    }
}
