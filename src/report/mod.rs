//! Trial-balance snapshots and day-over-day deltas.

mod diff;
mod trial_balance;

pub use diff::diff;
pub use trial_balance::parse;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One account's totals in a single report snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub account_name: String,
    pub debit: f64,
    pub credit: f64,
}

impl AccountBalance {
    pub fn zero(account_name: &str) -> Self {
        Self {
            account_name: account_name.to_string(),
            debit: 0.0,
            credit: 0.0,
        }
    }
}

/// Signed change of one account between two snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub account_name: String,
    pub debit_diff: f64,
    pub credit_diff: f64,
}

/// Balances keyed by account name.
pub type Snapshot = BTreeMap<String, AccountBalance>;
