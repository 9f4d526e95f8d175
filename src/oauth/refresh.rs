//! Background token refresh daemon.
//!
//! Wakes on a fixed interval and refreshes the stored token when it expires
//! within the lead window, so the daily sync rarely has to refresh inline.

use chrono::Duration;
use std::sync::Arc;
use tracing::{error, info};

use super::TokenManager;

/// Start the refresh daemon loop.
pub async fn refresh_daemon(manager: Arc<TokenManager>, interval: std::time::Duration, lead: Duration) {
    info!(
        interval_secs = interval.as_secs(),
        lead_secs = lead.num_seconds(),
        "Token refresh daemon started"
    );

    loop {
        tokio::time::sleep(interval).await;
        match manager.refresh_if_expiring(lead).await {
            Ok(true) => info!("Proactively refreshed access token"),
            Ok(false) => {}
            Err(e) => error!("Refresh cycle error: {e}"),
        }
    }
}
