//! Report assembly. `gather` turns loaded ledger rows into per-account
//! results; `render_markdown` is a pure function of those results and the
//! report options.

mod markdown;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::policy::SETTLEMENT_POLICY_V1;
use crate::analysis::types::{
    AccountRecord, AccountSummary, CashFlow, CategoryTotal, LedgerTransaction, MonthlyTrend,
    PaymentPatterns, RecentActivity,
};
use crate::analysis::{
    account_summary, cash_flow, category_totals, monthly_trends, payment_patterns,
    recent_activity,
};
use crate::contracts::types::AccountType;
use crate::split::{BalanceSplit, ExpenseSplit, SplitParties, balance_split, expense_split};

pub use markdown::render_markdown;

pub const DEFAULT_RECENT_DAYS: i64 = 30;
/// A century. Wider windows would reach past the calendar `chrono` can
/// represent.
pub const MAX_RECENT_DAYS: i64 = 36_500;
pub const CHART_FILE_SUFFIX: &str = "_top_categories.png";

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub parties: SplitParties,
    pub recent_days: i64,
    pub as_of: NaiveDate,
    /// Footer timestamp. The only part of the output that varies between runs.
    pub generated_at: String,
    /// Image link per account key, for accounts whose chart exists.
    pub charts: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountReport {
    pub account_key: String,
    pub account_type: AccountType,
    pub summary: AccountSummary,
    pub categories: Vec<CategoryTotal>,
    pub cash_flow: CashFlow,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub recent_activity: RecentActivity,
    pub payment_patterns: PaymentPatterns,
    pub balance_split: BalanceSplit,
    pub expense_split: ExpenseSplit,
}

impl AccountReport {
    /// `Credit Card (team_beeb_cc)`.
    pub fn heading(&self) -> String {
        format!("{} ({})", self.account_type.label(), self.account_key)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub as_of: NaiveDate,
    pub accounts: Vec<AccountReport>,
}

pub fn chart_file_name(account_key: &str) -> String {
    format!("{account_key}{CHART_FILE_SUFFIX}")
}

pub fn build_account_report(
    account: &AccountRecord,
    transactions: &[LedgerTransaction],
    parties: &SplitParties,
    recent_days: i64,
    as_of: NaiveDate,
    today: NaiveDate,
) -> AccountReport {
    let policy = SETTLEMENT_POLICY_V1;
    AccountReport {
        account_key: account.account_key.clone(),
        account_type: account.account_type,
        summary: account_summary(&account.account_key, transactions, today),
        categories: category_totals(transactions),
        cash_flow: cash_flow(transactions),
        monthly_trends: monthly_trends(transactions),
        recent_activity: recent_activity(transactions, recent_days, as_of),
        payment_patterns: payment_patterns(transactions, policy),
        balance_split: balance_split(transactions, parties.ratio, policy),
        expense_split: expense_split(transactions, parties.ratio, as_of, policy),
    }
}

/// Builds one `AccountReport` per account, in account-key order.
pub fn gather(
    accounts: &[AccountRecord],
    transactions: &[LedgerTransaction],
    parties: &SplitParties,
    recent_days: i64,
    as_of: NaiveDate,
    today: NaiveDate,
) -> ReportData {
    let mut by_account: BTreeMap<&str, Vec<LedgerTransaction>> = BTreeMap::new();
    for transaction in transactions {
        by_account
            .entry(transaction.account_key.as_str())
            .or_default()
            .push(transaction.clone());
    }

    let mut ordered = accounts.to_vec();
    ordered.sort_by(|left, right| left.account_key.cmp(&right.account_key));

    let reports = ordered
        .iter()
        .map(|account| {
            let rows = by_account
                .get(account.account_key.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            build_account_report(account, rows, parties, recent_days, as_of, today)
        })
        .collect();

    ReportData {
        as_of,
        accounts: reports,
    }
}

/// The latest stored date, used as the default reference date.
pub fn latest_posted_at(transactions: &[LedgerTransaction]) -> Option<NaiveDate> {
    transactions
        .iter()
        .map(|transaction| transaction.posted_at)
        .max()
}
