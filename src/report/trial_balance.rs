//! Parser for the row/column JSON shape of the TrialBalance report.
//!
//! Only top-level `Rows.Row[*].ColData` is read. Rows with fewer than three
//! columns (headers, section summaries) are skipped without error.

use serde::Deserialize;
use serde_json::Value;

use super::{AccountBalance, Snapshot};
use crate::error::SyncError;

#[derive(Debug, Deserialize)]
struct Report {
    #[serde(rename = "Rows", default)]
    rows: Option<Rows>,
}

#[derive(Debug, Deserialize)]
struct Rows {
    #[serde(rename = "Row", default)]
    row: Option<Vec<Row>>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(rename = "ColData", default)]
    col_data: Option<Vec<ColData>>,
}

#[derive(Debug, Deserialize)]
struct ColData {
    // `None` only when the key is absent; an explicit null stays `Some(Value::Null)`
    #[serde(default, deserialize_with = "present")]
    value: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Parse a report body into balances keyed by account name.
pub fn parse(report: &Value) -> Result<Snapshot, SyncError> {
    let report = Report::deserialize(report)
        .map_err(|e| SyncError::MalformedReport(format!("Unexpected report shape: {e}")))?;

    let rows = report.rows.and_then(|r| r.row).unwrap_or_default();
    let mut accounts = Snapshot::new();

    for row in rows {
        let cols = match row.col_data {
            Some(cols) if cols.len() >= 3 => cols,
            _ => continue,
        };

        let account_name = cell_text(&cols[0], "account")?;
        let debit = amount(&cols[1], &account_name, "debit")?;
        let credit = amount(&cols[2], &account_name, "credit")?;

        accounts.insert(
            account_name.clone(),
            AccountBalance {
                account_name,
                debit,
                credit,
            },
        );
    }

    Ok(accounts)
}

fn cell_text(cell: &ColData, column: &str) -> Result<String, SyncError> {
    match &cell.value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(SyncError::MalformedReport(format!(
            "{column} column has no value"
        ))),
    }
}

// Null and empty cells mean zero. Surrounding whitespace is tolerated, a blank cell is not.
fn amount(cell: &ColData, account: &str, column: &str) -> Result<f64, SyncError> {
    if matches!(cell.value, Some(Value::Null)) {
        return Ok(0.0);
    }

    let text = cell_text(cell, column)
        .map_err(|_| SyncError::MalformedReport(format!("{account}: {column} column has no value")))?;
    if text.is_empty() {
        return Ok(0.0);
    }

    text.trim().parse::<f64>().map_err(|_| {
        SyncError::MalformedReport(format!("{account}: {column} value {text:?} is not a number"))
    })
}
