//! Common fakes for trial-balance-sync integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine as _;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use trial_balance_sync::client::{ApiClient, Reply, RetryPolicy, Transport};
use trial_balance_sync::clock::{Clock, Sleeper};
use trial_balance_sync::crypto::StateSigner;
use trial_balance_sync::ledger::LedgerWriter;
use trial_balance_sync::oauth::{
    ClientCredentials, OAuthProvider, OAuthSettings, TokenGrant, TokenManager, TokenSet,
};
use trial_balance_sync::report::BalanceDelta;
use trial_balance_sync::store::MemoryTokenStore;
use trial_balance_sync::SyncError;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,trial_balance_sync=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// 2024-01-02 09:00:00 UTC
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// =============================================================================
// Time
// =============================================================================

pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(now),
        })
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Records requested delays and returns immediately.
#[derive(Default)]
pub struct RecordingSleeper {
    slept: Mutex<Vec<std::time::Duration>>,
}

impl RecordingSleeper {
    pub fn slept(&self) -> Vec<std::time::Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: std::time::Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}

// =============================================================================
// OAuth
// =============================================================================

/// Provider that mints `access-N` / `refresh-N` pairs and counts calls.
pub struct FakeProvider {
    pub exchanges: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub refreshed_with: Mutex<Vec<String>>,
    pub expires_in: Option<u64>,
    pub fail_refresh: bool,
    pub refresh_delay: Option<std::time::Duration>,
    pub minted: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            exchanges: AtomicUsize::new(0),
            refreshes: AtomicUsize::new(0),
            refreshed_with: Mutex::new(Vec::new()),
            expires_in: Some(3600),
            fail_refresh: false,
            refresh_delay: None,
            minted: AtomicUsize::new(0),
        }
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    fn mint(&self) -> TokenGrant {
        let n = self.minted.fetch_add(1, Ordering::SeqCst) + 1;
        TokenGrant {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{n}"),
            expires_in: self.expires_in,
        }
    }
}

#[async_trait]
impl OAuthProvider for FakeProvider {
    fn id(&self) -> &str {
        "fake"
    }

    fn auth_url(
        &self,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
        state: &str,
    ) -> Result<String, SyncError> {
        let mut url = url::Url::parse("https://auth.example.com/authorize").unwrap();
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
        _client: &ClientCredentials,
        _redirect_uri: &str,
    ) -> Result<TokenGrant, SyncError> {
        self.exchanges.fetch_add(1, Ordering::SeqCst);
        if code == "bad-code" {
            return Err(SyncError::AuthExchange("invalid_grant".into()));
        }
        Ok(self.mint())
    }

    async fn refresh_token(
        &self,
        refresh_token: &str,
        _client: &ClientCredentials,
    ) -> Result<TokenGrant, SyncError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        self.refreshed_with
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if let Some(delay) = self.refresh_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_refresh {
            return Err(SyncError::AuthRefresh("invalid_grant".into()));
        }
        Ok(self.mint())
    }
}

pub fn settings() -> OAuthSettings {
    OAuthSettings {
        client: ClientCredentials {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
        },
        redirect_uri: "https://sync.example.com/v1/oauth/callback".into(),
        scope: "com.intuit.quickbooks.accounting".into(),
    }
}

pub fn signer() -> StateSigner {
    let secret = base64::engine::general_purpose::STANDARD.encode([0x42u8; 32]);
    StateSigner::new(&secret).unwrap()
}

pub fn manager(
    provider: Arc<FakeProvider>,
    store: Arc<MemoryTokenStore>,
    clock: Arc<FixedClock>,
) -> Arc<TokenManager> {
    Arc::new(TokenManager::new(settings(), provider, store, clock, signer()))
}

/// A token pair that expires `ttl` after `t0()`.
pub fn stored_tokens(name: &str, ttl: Duration) -> TokenSet {
    TokenSet {
        access_token: format!("{name}-access"),
        refresh_token: format!("{name}-refresh"),
        expires_at: t0() + ttl,
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Replays canned replies in order and records what was requested.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    pub requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<(StatusCode, String)>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(status, body)| Reply { status, body })
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, token)| token.clone())
            .collect()
    }

    pub fn urls_seen(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, access_token: &str) -> Result<Reply, SyncError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), access_token.to_string()));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SyncError::Transport("no scripted reply left".into()))
    }
}

pub fn ok(body: serde_json::Value) -> (StatusCode, String) {
    (StatusCode::OK, body.to_string())
}

pub fn status(code: StatusCode) -> (StatusCode, String) {
    (code, r#"{"Fault":{"type":"SERVICE"}}"#.to_string())
}

pub fn api_client(
    tokens: Arc<TokenManager>,
    transport: Arc<ScriptedTransport>,
    sleeper: Arc<RecordingSleeper>,
) -> ApiClient {
    ApiClient::new(tokens, transport, sleeper, RetryPolicy::default())
}

/// Trial balance body with one `[name, debit, credit]` row per entry.
pub fn trial_balance(rows: &[(&str, &str, &str)]) -> serde_json::Value {
    let rows: Vec<serde_json::Value> = rows
        .iter()
        .map(|(name, debit, credit)| {
            serde_json::json!({
                "ColData": [
                    { "value": name, "id": "1" },
                    { "value": debit },
                    { "value": credit },
                ]
            })
        })
        .collect();

    serde_json::json!({
        "Header": { "ReportName": "TrialBalance", "Currency": "USD" },
        "Columns": { "Column": [
            { "ColTitle": "", "ColType": "Account" },
            { "ColTitle": "Debit", "ColType": "Money" },
            { "ColTitle": "Credit", "ColType": "Money" },
        ]},
        "Rows": { "Row": rows }
    })
}

// =============================================================================
// Ledger
// =============================================================================

#[derive(Default)]
pub struct RecordingLedger {
    pub commits: Mutex<Vec<(Vec<BalanceDelta>, NaiveDate)>>,
    pub fail: bool,
}

impl RecordingLedger {
    pub fn failing() -> Self {
        Self {
            commits: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn commits(&self) -> Vec<(Vec<BalanceDelta>, NaiveDate)> {
        self.commits.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerWriter for RecordingLedger {
    async fn commit(&self, records: &[BalanceDelta], as_of: NaiveDate) -> Result<(), SyncError> {
        if self.fail {
            return Err(SyncError::LedgerWrite("connection reset".into()));
        }
        self.commits
            .lock()
            .unwrap()
            .push((records.to_vec(), as_of));
        Ok(())
    }
}
