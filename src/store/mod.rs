//! Token store: durable home of the single access/refresh token pair.
//!
//! The pair is overwritten wholesale on every change; there is exactly one
//! record per deployment.

pub mod file;
pub mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::oauth::TokenSet;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored pair. `None` when nothing usable has been stored yet.
    async fn load(&self) -> Result<Option<TokenSet>, SyncError>;

    /// Replace the stored pair.
    async fn save(&self, tokens: &TokenSet) -> Result<(), SyncError>;
}
