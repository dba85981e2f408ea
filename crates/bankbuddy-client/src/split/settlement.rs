use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::analysis::policy::SettlementPolicy;
use crate::analysis::types::LedgerTransaction;

/// A group of transfers that paid off the shared balance built up since the
/// previous settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub settled_on: NaiveDate,
    pub amount: Decimal,
    pub outstanding_before: Decimal,
    pub residual: Decimal,
    pub txn_ids: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SettlementScan {
    pub settlements: Vec<Settlement>,
    /// Shared expenses accrued since the last settlement, net of its residual.
    pub outstanding: Decimal,
    pub settlement_txn_ids: BTreeSet<String>,
}

impl SettlementScan {
    pub fn last_settlement_date(&self) -> Option<NaiveDate> {
        self.settlements.last().map(|settlement| settlement.settled_on)
    }

    pub fn is_settlement(&self, transaction: &LedgerTransaction) -> bool {
        self.settlement_txn_ids.contains(&transaction.txn_id)
    }
}

struct TransferGroup<'a> {
    started_on: NaiveDate,
    members: Vec<&'a LedgerTransaction>,
}

impl TransferGroup<'_> {
    fn sum(&self) -> Decimal {
        self.members.iter().map(|member| member.amount).sum()
    }
}

/// Walks one account's transactions in date order, tracking the outstanding
/// shared balance, and flags transfer groups that offset it.
pub fn detect_settlements(
    transactions: &[LedgerTransaction],
    policy: SettlementPolicy,
) -> SettlementScan {
    // Within a day, expenses count before the transfers that may pay them off.
    let mut ordered = transactions.iter().collect::<Vec<&LedgerTransaction>>();
    ordered.sort_by_key(|transaction| (transaction.posted_at, policy.is_transfer(transaction)));

    let mut scan = SettlementScan::default();
    let mut group: Option<TransferGroup<'_>> = None;

    for transaction in ordered {
        if policy.is_transfer(transaction) {
            if let Some(current) = &group
                && (transaction.posted_at - current.started_on).num_days() > policy.window_days
            {
                log::warn!(
                    "transfers starting {} on {} did not offset the shared balance",
                    current.started_on,
                    transaction.account_key
                );
                group = None;
            }

            let current = group.get_or_insert_with(|| TransferGroup {
                started_on: transaction.posted_at,
                members: Vec::new(),
            });
            current.members.push(transaction);

            let group_sum = current.sum();
            if policy.settles(group_sum, scan.outstanding) {
                let paid = group_sum.abs();
                let txn_ids = current
                    .members
                    .iter()
                    .map(|member| member.txn_id.clone())
                    .collect::<Vec<String>>();
                scan.settlement_txn_ids.extend(txn_ids.iter().cloned());
                let residual = scan.outstanding - paid;
                log::debug!(
                    "settlement of {paid} on {} for {}",
                    transaction.posted_at,
                    transaction.account_key
                );
                scan.settlements.push(Settlement {
                    settled_on: transaction.posted_at,
                    amount: paid,
                    outstanding_before: scan.outstanding,
                    residual,
                    txn_ids,
                });
                scan.outstanding = residual;
                group = None;
            }
            continue;
        }

        if policy.is_shared_expense(transaction) {
            scan.outstanding += transaction.amount.abs();
        }
    }

    scan
}
