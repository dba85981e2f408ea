use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::contracts::types::AccountType;

pub const UNCATEGORIZED: &str = "Uncategorized";

/// One stored transaction as read back for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub txn_id: String,
    pub account_key: String,
    pub posted_at: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub category: Option<String>,
}

impl LedgerTransaction {
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }

    pub fn is_deposit(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_withdrawal(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub account_key: String,
    pub account_type: AccountType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn of<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut range: Option<Self> = None;
        for date in dates {
            range = Some(match range {
                Some(current) => Self {
                    start: current.start.min(date),
                    end: current.end.max(date),
                },
                None => Self {
                    start: date,
                    end: date,
                },
            });
        }
        range
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub account_key: String,
    pub total_transactions: i64,
    pub total_amount: Decimal,
    pub largest_transaction: Option<Decimal>,
    pub smallest_transaction: Option<Decimal>,
    pub date_range: Option<DateRange>,
    pub most_frequent_category: Option<String>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CashFlow {
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub net: Decimal,
    pub deposit_count: i64,
    pub withdrawal_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub net: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentActivity {
    pub days: i64,
    pub as_of: NaiveDate,
    pub transaction_count: i64,
    pub total_amount: Decimal,
    pub top_categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentRecord {
    pub txn_id: String,
    pub posted_at: NaiveDate,
    pub amount: Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentPatterns {
    pub recent_payments: Vec<PaymentRecord>,
    pub total_recent_payments: Decimal,
    pub payment_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FutureTransaction {
    pub posted_at: NaiveDate,
    pub description: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub today: NaiveDate,
    pub total_transactions: i64,
    pub historical_count: i64,
    pub future_count: i64,
    pub near_future_count: i64,
    pub far_future_count: i64,
    pub far_future_preview: Vec<FutureTransaction>,
    pub historical_range: Option<DateRange>,
}
