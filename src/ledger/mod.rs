//! Ledger writer: persists delta records for a date.

mod postgres;

pub use postgres::PgLedgerWriter;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::SyncError;
use crate::report::BalanceDelta;

#[async_trait]
pub trait LedgerWriter: Send + Sync {
    /// Persist `records` under `as_of`. All rows land or none do.
    async fn commit(&self, records: &[BalanceDelta], as_of: NaiveDate) -> Result<(), SyncError>;
}
