use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::analysis::date::{month_key, within_trailing_window};
use crate::analysis::policy::SettlementPolicy;
use crate::analysis::types::{
    CashFlow, CategoryCount, CategoryTotal, LedgerTransaction, MonthlyTrend, PaymentPatterns,
    PaymentRecord, RecentActivity,
};

const TOP_CATEGORY_LIMIT: usize = 3;

/// Per-category totals, largest absolute total first. Rows without a category
/// are grouped under `Uncategorized`, so the totals always add up to the
/// account total.
pub fn category_totals(transactions: &[LedgerTransaction]) -> Vec<CategoryTotal> {
    let mut grouped: BTreeMap<&str, (Decimal, i64)> = BTreeMap::new();
    for transaction in transactions {
        let entry = grouped
            .entry(transaction.category_label())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += transaction.amount;
        entry.1 += 1;
    }

    let mut totals = grouped
        .into_iter()
        .map(|(category, (total, count))| CategoryTotal {
            category: category.to_string(),
            total,
            count,
        })
        .collect::<Vec<CategoryTotal>>();
    totals.sort_by(|left, right| {
        right
            .total
            .abs()
            .cmp(&left.total.abs())
            .then_with(|| left.category.cmp(&right.category))
    });
    totals
}

pub fn cash_flow(transactions: &[LedgerTransaction]) -> CashFlow {
    let mut flow = CashFlow {
        deposits: Decimal::ZERO,
        withdrawals: Decimal::ZERO,
        net: Decimal::ZERO,
        deposit_count: 0,
        withdrawal_count: 0,
    };
    for transaction in transactions {
        if transaction.is_deposit() {
            flow.deposits += transaction.amount;
            flow.deposit_count += 1;
        } else if transaction.is_withdrawal() {
            flow.withdrawals += transaction.amount;
            flow.withdrawal_count += 1;
        }
        flow.net += transaction.amount;
    }
    flow
}

/// Calendar-month rollup, oldest month first.
pub fn monthly_trends(transactions: &[LedgerTransaction]) -> Vec<MonthlyTrend> {
    let mut months: BTreeMap<String, Vec<&LedgerTransaction>> = BTreeMap::new();
    for transaction in transactions {
        months
            .entry(month_key(&transaction.posted_at))
            .or_default()
            .push(transaction);
    }

    months
        .into_iter()
        .map(|(month, rows)| {
            let mut trend = MonthlyTrend {
                month,
                deposits: Decimal::ZERO,
                withdrawals: Decimal::ZERO,
                net: Decimal::ZERO,
                count: rows.len() as i64,
            };
            for row in rows {
                if row.is_deposit() {
                    trend.deposits += row.amount;
                } else {
                    trend.withdrawals += row.amount;
                }
                trend.net += row.amount;
            }
            trend
        })
        .collect()
}

pub fn recent_activity(
    transactions: &[LedgerTransaction],
    days: i64,
    as_of: NaiveDate,
) -> RecentActivity {
    let recent = transactions
        .iter()
        .filter(|transaction| within_trailing_window(transaction.posted_at, as_of, days))
        .collect::<Vec<&LedgerTransaction>>();

    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for transaction in &recent {
        *counts.entry(transaction.category_label()).or_default() += 1;
    }
    let mut top_categories = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect::<Vec<CategoryCount>>();
    // BTreeMap order is alphabetical, so a stable sort keeps ties alphabetical.
    top_categories.sort_by(|left, right| right.count.cmp(&left.count));
    top_categories.truncate(TOP_CATEGORY_LIMIT);

    RecentActivity {
        days,
        as_of,
        transaction_count: recent.len() as i64,
        total_amount: recent.iter().map(|transaction| transaction.amount).sum(),
        top_categories,
    }
}

/// The most recent transfers, newest first, with absolute amounts.
pub fn payment_patterns(
    transactions: &[LedgerTransaction],
    policy: SettlementPolicy,
) -> PaymentPatterns {
    let mut transfers = transactions
        .iter()
        .filter(|transaction| policy.is_transfer(transaction))
        .collect::<Vec<&LedgerTransaction>>();
    transfers.sort_by(|left, right| {
        right
            .posted_at
            .cmp(&left.posted_at)
            .then_with(|| left.txn_id.cmp(&right.txn_id))
    });

    let recent_payments = transfers
        .into_iter()
        .take(policy.recent_payment_limit)
        .map(|transaction| PaymentRecord {
            txn_id: transaction.txn_id.clone(),
            posted_at: transaction.posted_at,
            amount: transaction.amount.abs(),
            description: transaction.description.clone(),
        })
        .collect::<Vec<PaymentRecord>>();

    PaymentPatterns {
        total_recent_payments: recent_payments.iter().map(|payment| payment.amount).sum(),
        payment_count: recent_payments.len() as i64,
        recent_payments,
    }
}
