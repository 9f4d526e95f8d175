//! HTTP surface tests: status, OAuth start/callback and the process trigger.

mod common;

use chrono::Duration;
use reqwest::StatusCode;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use common::{
    api_client, manager, ok, stored_tokens, t0, trial_balance, FakeProvider, FixedClock,
    RecordingLedger, RecordingSleeper, ScriptedTransport,
};
use trial_balance_sync::store::{MemoryTokenStore, TokenStore};
use trial_balance_sync::sync::DailySync;
use trial_balance_sync::{api, AppState, Config, SharedState};

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        redirect_uri: "https://sync.example.com/v1/oauth/callback".into(),
        auth_url: "https://auth.example.com/authorize".into(),
        token_url: "https://auth.example.com/token".into(),
        state_secret: String::new(),
        api_base_url: "https://api.example.com".into(),
        company_id: "9130".into(),
        retry_max_attempts: 5,
        retry_initial_backoff: std::time::Duration::from_secs(1),
        token_file: PathBuf::from("unused.json"),
        database_url: String::new(),
        ledger_table: "balance_deltas".into(),
        refresh_interval: std::time::Duration::from_secs(300),
        refresh_lead: Duration::minutes(10),
    }
}

struct App {
    base: String,
    http: reqwest::Client,
    store: Arc<MemoryTokenStore>,
    ledger: Arc<RecordingLedger>,
}

async fn spawn_app(store: MemoryTokenStore, replies: Vec<(StatusCode, String)>) -> App {
    common::init_tracing();
    let clock = FixedClock::at(t0());
    let store = Arc::new(store);
    let ledger = Arc::new(RecordingLedger::default());
    let tokens = manager(Arc::new(FakeProvider::new()), store.clone(), clock.clone());
    let client = api_client(
        tokens.clone(),
        ScriptedTransport::new(replies),
        Arc::new(RecordingSleeper::default()),
    );
    let config = test_config();
    let sync = DailySync::new(
        client,
        ledger.clone(),
        clock,
        config.api_base_url.clone(),
        config.company_id.clone(),
    );

    let state: SharedState = Arc::new(AppState {
        config,
        tokens,
        sync,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::router(state)).await.ok();
    });

    App {
        base: format!("http://{addr}"),
        http: reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap(),
        store,
        ledger,
    }
}

#[tokio::test]
async fn test_status_reports_service() {
    let app = spawn_app(MemoryTokenStore::new(), vec![]).await;

    let body: Value = app
        .http
        .get(format!("{}/v1/status", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "trial-balance-sync");
}

#[tokio::test]
async fn test_oauth_round_trip_stores_tokens() {
    let app = spawn_app(MemoryTokenStore::new(), vec![]).await;

    let resp = app
        .http
        .get(format!("{}/v1/oauth/start", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    let location = resp.headers()["location"].to_str().unwrap().to_string();
    let location = url::Url::parse(&location).unwrap();
    let state = location
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .unwrap();

    let resp = app
        .http
        .get(format!("{}/v1/oauth/callback", app.base))
        .query(&[("code", "auth-code"), ("state", state.as_str()), ("realmId", "9130")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = app.store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-1");
}

#[tokio::test]
async fn test_callback_with_forged_state_is_rejected() {
    let app = spawn_app(MemoryTokenStore::new(), vec![]).await;

    let resp = app
        .http
        .get(format!("{}/v1/oauth/callback", app.base))
        .query(&[("code", "auth-code"), ("state", "forged")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "invalid_state");
    assert_eq!(app.store.save_count(), 0);
}

#[tokio::test]
async fn test_process_returns_recorded_deltas() {
    let app = spawn_app(
        MemoryTokenStore::with_tokens(stored_tokens("live", Duration::hours(1))),
        vec![
            ok(trial_balance(&[("Cash", "100", ""), ("Rev", "", "50")])),
            ok(trial_balance(&[])),
        ],
    )
    .await;

    let resp = app
        .http
        .get(format!("{}/v1/process", app.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["account_name"], "Cash");
    assert_eq!(data[0]["debit_diff"], 100.0);
    assert_eq!(data[1]["credit_diff"], 50.0);
    assert_eq!(app.ledger.commits().len(), 1);
}

#[tokio::test]
async fn test_process_without_tokens_is_unauthorized() {
    let app = spawn_app(MemoryTokenStore::new(), vec![]).await;

    let resp = app
        .http
        .get(format!("{}/v1/process", app.base))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_authenticated");
    assert!(app.ledger.commits().is_empty());
}
