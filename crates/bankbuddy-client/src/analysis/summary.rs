use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::analysis::types::{
    AccountSummary, DataQuality, DateRange, FutureTransaction, LedgerTransaction,
};

const NEAR_FUTURE_DAYS: i64 = 7;
const FAR_FUTURE_PREVIEW_LIMIT: usize = 5;

/// Headline numbers for one account. Rows dated after `today` still count
/// toward totals but not toward the reported date range.
pub fn account_summary(
    account_key: &str,
    transactions: &[LedgerTransaction],
    today: NaiveDate,
) -> AccountSummary {
    let total_amount = transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum::<Decimal>();

    AccountSummary {
        account_key: account_key.to_string(),
        total_transactions: transactions.len() as i64,
        total_amount,
        largest_transaction: transactions.iter().map(|transaction| transaction.amount).max(),
        smallest_transaction: transactions.iter().map(|transaction| transaction.amount).min(),
        date_range: DateRange::of(
            transactions
                .iter()
                .map(|transaction| transaction.posted_at)
                .filter(|posted_at| *posted_at <= today),
        ),
        most_frequent_category: most_frequent_category(transactions),
        data_quality: data_quality(transactions, today),
    }
}

/// Mode of the bank-supplied categories; ties go to the alphabetically first.
pub fn most_frequent_category(transactions: &[LedgerTransaction]) -> Option<String> {
    let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
    for transaction in transactions {
        if let Some(category) = transaction.category.as_deref() {
            *counts.entry(category).or_default() += 1;
        }
    }

    let mut best: Option<(&str, i64)> = None;
    for (category, count) in counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((category, count)),
        }
    }
    best.map(|(category, _)| category.to_string())
}

/// Splits rows by date relative to `today`: historical, near-future
/// (pending within a week) and far-future (scheduled).
pub fn data_quality(transactions: &[LedgerTransaction], today: NaiveDate) -> DataQuality {
    let cutoff = today + Duration::days(NEAR_FUTURE_DAYS);
    let mut historical = Vec::new();
    let mut near_future_count = 0_i64;
    let mut far_future = Vec::new();

    for transaction in transactions {
        if transaction.posted_at <= today {
            historical.push(transaction.posted_at);
        } else if transaction.posted_at <= cutoff {
            near_future_count += 1;
        } else {
            far_future.push(transaction);
        }
    }

    let far_future_count = far_future.len() as i64;
    DataQuality {
        today,
        total_transactions: transactions.len() as i64,
        historical_count: historical.len() as i64,
        future_count: near_future_count + far_future_count,
        near_future_count,
        far_future_count,
        far_future_preview: far_future
            .into_iter()
            .take(FAR_FUTURE_PREVIEW_LIMIT)
            .map(|transaction| FutureTransaction {
                posted_at: transaction.posted_at,
                description: transaction.description.clone(),
                amount: transaction.amount,
            })
            .collect(),
        historical_range: DateRange::of(historical),
    }
}
