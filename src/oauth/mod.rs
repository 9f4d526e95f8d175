mod manager;
mod quickbooks;
mod refresh;
mod traits;

pub use manager::{OAuthSettings, TokenManager};
pub use quickbooks::{
    QuickBooksProvider, QUICKBOOKS_ACCOUNTING_SCOPE, QUICKBOOKS_AUTH_URL, QUICKBOOKS_TOKEN_URL,
};
pub use refresh::refresh_daemon;
pub use traits::{ClientCredentials, OAuthProvider, TokenGrant, TokenSet, DEFAULT_EXPIRES_IN_SECS};
