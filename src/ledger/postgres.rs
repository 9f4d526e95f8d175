//! PostgreSQL-backed ledger writer.
//!
//! Expects an existing table with columns
//! `(account_name TEXT, debit_diff DOUBLE PRECISION, credit_diff DOUBLE PRECISION, as_of_date DATE)`.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;

use super::LedgerWriter;
use crate::error::SyncError;
use crate::report::BalanceDelta;

pub struct PgLedgerWriter {
    pool: PgPool,
    insert_sql: String,
}

impl PgLedgerWriter {
    pub async fn connect(db_url: &str, table: &str) -> Result<Self, SyncError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .map_err(|e| SyncError::LedgerWrite(format!("Failed to connect to PostgreSQL: {e}")))?;

        Self::from_pool(pool, table)
    }

    pub fn from_pool(pool: PgPool, table: &str) -> Result<Self, SyncError> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            insert_sql: format!(
                "INSERT INTO {table} (account_name, debit_diff, credit_diff, as_of_date) \
                 VALUES ($1, $2, $3, $4)"
            ),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerWriter for PgLedgerWriter {
    async fn commit(&self, records: &[BalanceDelta], as_of: NaiveDate) -> Result<(), SyncError> {
        if records.is_empty() {
            return Ok(());
        }

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;

        for record in records {
            sqlx::query(&self.insert_sql)
                .bind(&record.account_name)
                .bind(record.debit_diff)
                .bind(record.credit_diff)
                .bind(as_of)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    SyncError::LedgerWrite(format!(
                        "Insert for account {:?} failed: {e}",
                        record.account_name
                    ))
                })?;
        }

        tx.commit().await?;
        info!(rows = records.len(), %as_of, "Ledger deltas committed");
        Ok(())
    }
}

/// Accept `name` or `schema.name` made of ASCII letters, digits and underscores.
fn validate_table_name(table: &str) -> Result<(), SyncError> {
    let valid_part = |part: &str| {
        !part.is_empty()
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = table.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| valid_part(p)) {
        return Err(SyncError::Config(format!("Invalid ledger table name: {table:?}")));
    }
    Ok(())
}
