use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unified error type for the trial-balance sync.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    // ── Auth Errors ─────────────────────────────────────────────────────
    #[error("Tokens not found. Please authenticate.")]
    NotAuthenticated,

    #[error("Failed to get tokens: {0}")]
    AuthExchange(String),

    #[error("Failed to refresh tokens: {0}")]
    AuthRefresh(String),

    #[error("Invalid state parameter")]
    InvalidState,

    // ── API Errors ──────────────────────────────────────────────────────
    #[error("API call failed after {attempts} attempts")]
    ApiCallExhausted { attempts: u32 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request cancelled")]
    Cancelled,

    // ── Data Errors ─────────────────────────────────────────────────────
    #[error("Malformed report: {0}")]
    MalformedReport(String),

    #[error("Token store error: {0}")]
    TokenStore(String),

    #[error("Ledger write failed: {0}")]
    LedgerWrite(String),

    // ── Internal ────────────────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::NotAuthenticated => "not_authenticated",
            SyncError::AuthExchange(_) => "auth_exchange_failed",
            SyncError::AuthRefresh(_) => "auth_refresh_failed",
            SyncError::InvalidState => "invalid_state",
            SyncError::ApiCallExhausted { .. } => "api_call_exhausted",
            SyncError::Transport(_) => "transport_error",
            SyncError::Cancelled => "cancelled",
            SyncError::MalformedReport(_) => "malformed_report",
            SyncError::TokenStore(_) => "token_store_error",
            SyncError::LedgerWrite(_) => "ledger_write_failed",
            SyncError::Config(_) => "config_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            SyncError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            SyncError::InvalidState => StatusCode::BAD_REQUEST,
            SyncError::AuthExchange(_)
            | SyncError::AuthRefresh(_)
            | SyncError::ApiCallExhausted { .. }
            | SyncError::Transport(_)
            | SyncError::MalformedReport(_) => StatusCode::BAD_GATEWAY,
            SyncError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            SyncError::TokenStore(_) | SyncError::LedgerWrite(_) | SyncError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {e}");
        SyncError::LedgerWrite(e.to_string())
    }
}

impl IntoResponse for SyncError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });

        (self.status(), axum::Json(body)).into_response()
    }
}
