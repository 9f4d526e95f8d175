use std::collections::{BTreeMap, BTreeSet};

use super::{AccountBalance, BalanceDelta, Snapshot};

/// Signed per-account change from `previous` to `current`.
///
/// Covers the union of both key sets; an account missing on either side
/// counts as zero, so an account that disappears yields `-previous`.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> BTreeMap<String, BalanceDelta> {
    let names: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();

    names
        .into_iter()
        .map(|name| {
            let prev = previous
                .get(name)
                .cloned()
                .unwrap_or_else(|| AccountBalance::zero(name));
            let curr = current
                .get(name)
                .cloned()
                .unwrap_or_else(|| AccountBalance::zero(name));

            let delta = BalanceDelta {
                account_name: name.clone(),
                debit_diff: curr.debit - prev.debit,
                credit_diff: curr.credit - prev.credit,
            };
            (name.clone(), delta)
        })
        .collect()
}
