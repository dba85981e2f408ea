//! Splitting shared expenses between two people.

pub mod allocation;
pub mod settlement;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::analysis::date::{format_iso_date, within_trailing_window};
use crate::analysis::policy::{SETTLEMENT_POLICY_VERSION, SettlementPolicy};
use crate::analysis::types::{DateRange, LedgerTransaction};

pub use allocation::{Allocation, SplitRatio, split_amount};
pub use settlement::{Settlement, SettlementScan, detect_settlements};

pub const DEFAULT_PERSON1_NAME: &str = "Person 1";
pub const DEFAULT_PERSON2_NAME: &str = "Person 2";
pub const FALLBACK_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitParties {
    pub person1_name: String,
    pub person2_name: String,
    pub ratio: SplitRatio,
}

impl Default for SplitParties {
    fn default() -> Self {
        Self {
            person1_name: DEFAULT_PERSON1_NAME.to_string(),
            person2_name: DEFAULT_PERSON2_NAME.to_string(),
            ratio: SplitRatio::even(),
        }
    }
}

impl SplitParties {
    pub fn parameters(&self) -> SplitParameters {
        SplitParameters {
            person1_name: self.person1_name.clone(),
            person2_name: self.person2_name.clone(),
            person1_percentage: self.ratio.person1_percentage(),
            person2_percentage: self.ratio.person2_percentage(),
            settlement_policy: SETTLEMENT_POLICY_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitParameters {
    pub person1_name: String,
    pub person2_name: String,
    pub person1_percentage: Decimal,
    pub person2_percentage: Decimal,
    pub settlement_policy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: Decimal,
    pub count: i64,
    pub shares: Allocation,
}

/// Split of the whole account history.
#[derive(Debug, Clone, Serialize)]
pub struct BalanceSplit {
    pub total_balance: Decimal,
    pub balance_shares: Allocation,
    pub total_expenses: Decimal,
    pub expense_shares: Allocation,
    pub total_payments_credits: Decimal,
    pub expense_count: i64,
    pub category_breakdown: Vec<CategoryShare>,
    pub date_range: Option<DateRange>,
}

/// New shared expenses since the last detected settlement.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseSplit {
    pub period: String,
    pub last_settlement_date: Option<NaiveDate>,
    pub total_expenses: Decimal,
    pub shares: Allocation,
    pub expense_count: i64,
    pub date_range: Option<DateRange>,
    pub category_breakdown: Vec<CategoryShare>,
    pub settlements: Vec<Settlement>,
    pub outstanding: Decimal,
}

pub fn balance_split(
    transactions: &[LedgerTransaction],
    ratio: SplitRatio,
    policy: SettlementPolicy,
) -> BalanceSplit {
    let total_balance = transactions
        .iter()
        .map(|transaction| transaction.amount)
        .sum::<Decimal>();
    let expenses = transactions
        .iter()
        .filter(|transaction| policy.is_shared_expense(transaction))
        .collect::<Vec<&LedgerTransaction>>();
    let total_expenses = expenses
        .iter()
        .map(|transaction| transaction.amount.abs())
        .sum::<Decimal>();
    let total_payments_credits = transactions
        .iter()
        .filter(|transaction| transaction.is_deposit())
        .map(|transaction| transaction.amount)
        .sum::<Decimal>();

    BalanceSplit {
        total_balance,
        balance_shares: ratio.allocate(total_balance),
        total_expenses,
        expense_shares: ratio.allocate(total_expenses),
        total_payments_credits,
        expense_count: expenses.len() as i64,
        category_breakdown: category_shares(&expenses, ratio),
        date_range: DateRange::of(transactions.iter().map(|transaction| transaction.posted_at)),
    }
}

/// Shared expenses after the last settlement on or before `as_of`. With no
/// settlement on record the trailing 30 days before `as_of` are used.
pub fn expense_split(
    transactions: &[LedgerTransaction],
    ratio: SplitRatio,
    as_of: NaiveDate,
    policy: SettlementPolicy,
) -> ExpenseSplit {
    let visible = transactions
        .iter()
        .filter(|transaction| transaction.posted_at <= as_of)
        .cloned()
        .collect::<Vec<LedgerTransaction>>();
    let scan = detect_settlements(&visible, policy);
    let last_settlement_date = scan.last_settlement_date();

    let (period, expenses) = match last_settlement_date {
        Some(settled_on) => (
            format!("Since last settlement on {}", format_iso_date(&settled_on)),
            visible
                .iter()
                .filter(|transaction| transaction.posted_at > settled_on)
                .filter(|transaction| policy.is_shared_expense(transaction))
                .collect::<Vec<&LedgerTransaction>>(),
        ),
        None => (
            format!("Last {FALLBACK_WINDOW_DAYS} days (no settlement pattern detected)"),
            visible
                .iter()
                .filter(|transaction| {
                    within_trailing_window(transaction.posted_at, as_of, FALLBACK_WINDOW_DAYS)
                })
                .filter(|transaction| policy.is_shared_expense(transaction))
                .collect::<Vec<&LedgerTransaction>>(),
        ),
    };

    let total_expenses = expenses
        .iter()
        .map(|transaction| transaction.amount.abs())
        .sum::<Decimal>();

    ExpenseSplit {
        period,
        last_settlement_date,
        total_expenses,
        shares: ratio.allocate(total_expenses),
        expense_count: expenses.len() as i64,
        date_range: DateRange::of(expenses.iter().map(|transaction| transaction.posted_at)),
        category_breakdown: category_shares(&expenses, ratio),
        settlements: scan.settlements,
        outstanding: scan.outstanding,
    }
}

fn category_shares(expenses: &[&LedgerTransaction], ratio: SplitRatio) -> Vec<CategoryShare> {
    let mut grouped: BTreeMap<&str, (Decimal, i64)> = BTreeMap::new();
    for transaction in expenses {
        let entry = grouped
            .entry(transaction.category_label())
            .or_insert((Decimal::ZERO, 0));
        entry.0 += transaction.amount.abs();
        entry.1 += 1;
    }

    let mut shares = grouped
        .into_iter()
        .map(|(category, (total, count))| CategoryShare {
            category: category.to_string(),
            total,
            count,
            shares: ratio.allocate(total),
        })
        .collect::<Vec<CategoryShare>>();
    shares.sort_by(|left, right| {
        right
            .total
            .cmp(&left.total)
            .then_with(|| left.category.cmp(&right.category))
    });
    shares
}
