//! Daily trial-balance sync: fetch two snapshots, diff, persist.

use chrono::{Days, NaiveDate};
use std::sync::Arc;
use tracing::info;

use crate::client::ApiClient;
use crate::clock::Clock;
use crate::error::SyncError;
use crate::ledger::LedgerWriter;
use crate::report::{self, BalanceDelta, Snapshot};

pub struct DailySync {
    client: ApiClient,
    ledger: Arc<dyn LedgerWriter>,
    clock: Arc<dyn Clock>,
    api_base_url: String,
    company_id: String,
}

impl DailySync {
    pub fn new(
        client: ApiClient,
        ledger: Arc<dyn LedgerWriter>,
        clock: Arc<dyn Clock>,
        api_base_url: impl Into<String>,
        company_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            ledger,
            clock,
            api_base_url: api_base_url.into(),
            company_id: company_id.into(),
        }
    }

    /// TrialBalance report URL covering the single day `date`.
    pub fn report_url(&self, date: NaiveDate) -> Result<String, SyncError> {
        let base = self.api_base_url.trim_end_matches('/');
        let mut url = url::Url::parse(&format!(
            "{base}/v3/company/{}/reports/TrialBalance",
            self.company_id
        ))
        .map_err(|e| SyncError::Config(format!("Invalid API base URL: {e}")))?;

        let day = date.format("%Y-%m-%d").to_string();
        url.query_pairs_mut()
            .append_pair("start_date", &day)
            .append_pair("end_date", &day);

        Ok(url.into())
    }

    pub async fn fetch_snapshot(&self, date: NaiveDate) -> Result<Snapshot, SyncError> {
        let url = self.report_url(date)?;
        let body = self.client.get(&url).await?;
        report::parse(&body)
    }

    /// Diff today's trial balance against yesterday's and record it under today's date.
    pub async fn process_today_vs_yesterday(&self) -> Result<Vec<BalanceDelta>, SyncError> {
        let today = self.clock.now().date_naive();
        let yesterday = today
            .checked_sub_days(Days::new(1))
            .ok_or_else(|| SyncError::Config(format!("No day before {today}")))?;

        self.process_dates(yesterday, today).await
    }

    /// Diff `current` against `previous` and record the deltas under `current`.
    ///
    /// Both snapshots are fetched and parsed before anything is written.
    pub async fn process_dates(
        &self,
        previous: NaiveDate,
        current: NaiveDate,
    ) -> Result<Vec<BalanceDelta>, SyncError> {
        let current_accounts = self.fetch_snapshot(current).await?;
        let previous_accounts = self.fetch_snapshot(previous).await?;

        let records: Vec<BalanceDelta> = report::diff(&previous_accounts, &current_accounts)
            .into_values()
            .collect();

        self.ledger.commit(&records, current).await?;
        info!(
            %previous,
            %current,
            accounts = records.len(),
            "Trial balance deltas recorded"
        );

        Ok(records)
    }
}
