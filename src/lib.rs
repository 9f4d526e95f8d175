pub mod api;
pub mod client;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod oauth;
pub mod report;
pub mod store;
pub mod sync;

pub use config::Config;
pub use error::SyncError;

use std::sync::Arc;

/// Shared application state passed to all API handlers.
pub struct AppState {
    pub config: Config,
    pub tokens: Arc<oauth::TokenManager>,
    pub sync: sync::DailySync,
}

pub type SharedState = Arc<AppState>;
