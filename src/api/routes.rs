//! API route handlers.
//!
//! All handlers receive `SharedState` via Axum state extraction and return
//! `SyncError` on failure, which renders as `{"error": {"code", "message"}}`.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::SyncError;
use crate::SharedState;

pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/oauth/start", get(oauth_start))
        .route("/oauth/callback", get(oauth_callback))
        .route("/process", get(process))
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "trial-balance-sync",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// =============================================================================
// OAuth
// =============================================================================

/// GET /v1/oauth/start: Redirect to the authorization endpoint.
async fn oauth_start(State(state): State<SharedState>) -> Result<Response, SyncError> {
    let auth_url = state.tokens.authorize()?;
    Ok(Redirect::temporary(&auth_url).into_response())
}

#[derive(Deserialize)]
struct OAuthCallbackQuery {
    code: String,
    state: String,
    #[serde(rename = "realmId")]
    realm_id: Option<String>,
}

/// GET /v1/oauth/callback: Exchange the authorization code and store the tokens.
async fn oauth_callback(
    State(state): State<SharedState>,
    Query(q): Query<OAuthCallbackQuery>,
) -> Result<Json<serde_json::Value>, SyncError> {
    state.tokens.verify_state(&q.state)?;

    if let Some(realm) = q.realm_id.as_deref() {
        if realm != state.config.company_id {
            warn!(
                realm,
                configured = %state.config.company_id,
                "Authorized company differs from COMPANY_ID"
            );
        }
    }

    let tokens = state.tokens.exchange_and_store(&q.code).await?;
    info!("OAuth connection established");

    Ok(Json(json!({
        "data": { "expires_at": tokens.expires_at.to_rfc3339() }
    })))
}

// =============================================================================
// Sync
// =============================================================================

/// GET /v1/process: Diff today's trial balance against yesterday's.
async fn process(State(state): State<SharedState>) -> Result<Json<serde_json::Value>, SyncError> {
    let deltas = state.sync.process_today_vs_yesterday().await?;
    Ok(Json(json!({ "data": deltas })))
}
