use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::TokenStore;
use crate::error::SyncError;
use crate::oauth::TokenSet;

/// In-process token store. Keeps a count of saves so callers can observe persistence.
#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<TokenSet>>,
    saves: AtomicUsize,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self {
            tokens: Mutex::new(Some(tokens)),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>, SyncError> {
        Ok(self.tokens.lock().await.clone().filter(|t| !t.is_empty()))
    }

    async fn save(&self, tokens: &TokenSet) -> Result<(), SyncError> {
        *self.tokens.lock().await = Some(tokens.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
