use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use trial_balance_sync::client::{ApiClient, ReqwestTransport};
use trial_balance_sync::clock::{SystemClock, TokioSleeper};
use trial_balance_sync::crypto::StateSigner;
use trial_balance_sync::ledger::PgLedgerWriter;
use trial_balance_sync::oauth::{self, QuickBooksProvider, TokenManager};
use trial_balance_sync::store::FileTokenStore;
use trial_balance_sync::sync::DailySync;
use trial_balance_sync::{api, AppState, Config, SharedState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trial_balance_sync=info,tower_http=info".into()),
        )
        .init();

    // Load config
    let config = Config::from_env()?;
    info!("trial-balance-sync v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on {}:{}", config.host, config.port);

    // Initialize components
    let clock = Arc::new(SystemClock);
    let signer = StateSigner::new(&config.state_secret)?;
    let store = Arc::new(FileTokenStore::new(config.token_file.clone()));
    let provider = Arc::new(QuickBooksProvider::with_endpoints(
        config.auth_url.clone(),
        config.token_url.clone(),
    ));
    let tokens = Arc::new(TokenManager::new(
        config.oauth_settings(),
        provider,
        store,
        clock.clone(),
        signer,
    ));
    info!(token_file = %config.token_file.display(), "Token store ready ✓");

    let ledger = PgLedgerWriter::connect(&config.database_url, &config.ledger_table).await?;
    info!("Database connected ✓");

    let client = ApiClient::new(
        tokens.clone(),
        Arc::new(ReqwestTransport::new()),
        Arc::new(TokioSleeper),
        config.retry_policy(),
    );
    let sync = DailySync::new(
        client,
        Arc::new(ledger),
        clock,
        config.api_base_url.clone(),
        config.company_id.clone(),
    );

    // Build shared state
    let state: SharedState = Arc::new(AppState {
        config: config.clone(),
        tokens: tokens.clone(),
        sync,
    });

    // Start refresh daemon
    tokio::spawn(oauth::refresh_daemon(
        tokens,
        config.refresh_interval,
        config.refresh_lead,
    ));

    // Build router
    let app = api::router(state);

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server ready ✓");
    axum::serve(listener, app).await?;

    Ok(())
}
