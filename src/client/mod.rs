//! Resilient API client.
//!
//! Every request goes out with a valid bearer token. A 401 triggers a token
//! refresh and an immediate retry; any other non-200 status backs off
//! exponentially. Either way the attempt counts against the budget.

pub mod retry;
pub mod transport;

pub use retry::{RetryMachine, RetryPolicy, RetryState};
pub use transport::{ReqwestTransport, Reply, Transport};

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clock::Sleeper;
use crate::error::SyncError;
use crate::oauth::TokenManager;

pub struct ApiClient {
    tokens: Arc<TokenManager>,
    transport: Arc<dyn Transport>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl ApiClient {
    pub fn new(
        tokens: Arc<TokenManager>,
        transport: Arc<dyn Transport>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            tokens,
            transport,
            sleeper,
            policy,
        }
    }

    /// GET `url` and decode the JSON body.
    ///
    /// May refresh and persist the stored token as a side effect.
    pub async fn get(&self, url: &str) -> Result<serde_json::Value, SyncError> {
        self.get_with_cancel(url, &CancellationToken::new()).await
    }

    /// Like [`ApiClient::get`], abandoning pending requests and backoff sleeps once `cancel` fires.
    pub async fn get_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value, SyncError> {
        let mut token = self.tokens.current().await?;
        let mut machine = RetryMachine::new(self.policy.clone());
        let mut last_body = String::new();

        loop {
            match machine.state() {
                RetryState::Attempting => {
                    let reply = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                        reply = self.transport.get(url, &token.access_token) => reply?,
                    };

                    let status = reply.status;
                    last_body = reply.body;
                    if machine.observe(status) != RetryState::Succeeded {
                        warn!(
                            url,
                            attempt = machine.attempts(),
                            %status,
                            "API call failed"
                        );
                    }
                }
                RetryState::RefreshingAuth => {
                    token = self.tokens.force_refresh(&token).await?;
                    machine.resume();
                }
                RetryState::Backoff(delay) => {
                    debug!(url, backoff_ms = delay.as_millis() as u64, "Backing off");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                        _ = self.sleeper.sleep(delay) => {}
                    }
                    machine.resume();
                }
                RetryState::Succeeded => {
                    if machine.attempts() > 1 {
                        info!(url, attempt = machine.attempts(), "API call succeeded after retry");
                    }
                    return serde_json::from_str(&last_body).map_err(|e| {
                        SyncError::MalformedReport(format!("Response body is not JSON: {e}"))
                    });
                }
                RetryState::Exhausted => {
                    warn!(url, attempts = machine.attempts(), "API call failed after max attempts");
                    return Err(SyncError::ApiCallExhausted {
                        attempts: machine.attempts(),
                    });
                }
            }
        }
    }
}
