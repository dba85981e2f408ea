use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::report::AccountReport;
use crate::split::SplitParameters;

#[derive(Debug, Clone, Serialize)]
pub struct DataRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Checking,
    Savings,
    CreditCard,
    Other,
}

impl AccountType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::CreditCard => "credit_card",
            Self::Other => "other",
        }
    }

    /// Human label used in report headings.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Checking => "Checking",
            Self::Savings => "Savings",
            Self::CreditCard => "Credit Card",
            Self::Other => "Account",
        }
    }

    /// Infers the type from an account key such as `team_beeb_cc`.
    pub fn infer_from_key(account_key: &str) -> Self {
        let tokens = account_key.split('_').collect::<Vec<&str>>();
        if tokens.contains(&"cc") || account_key.contains("credit") {
            return Self::CreditCard;
        }
        if account_key.contains("checking") {
            return Self::Checking;
        }
        if account_key.contains("saving") {
            return Self::Savings;
        }
        Self::Other
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "checking" => Self::Checking,
            "savings" => Self::Savings,
            "credit_card" => Self::CreditCard,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub dry_run: bool,
    pub path: String,
    pub message: String,
    pub files: Vec<ImportFileResult>,
    pub summary: ImportSummary,
    pub duplicate_summary: ImportDuplicateSummary,
    pub next_step: ImportNextStep,
    pub other_actions: Vec<ImportAction>,
    pub data_range: DataRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportFileResult {
    pub source_ref: String,
    pub account_key: String,
    pub account_type: AccountType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_id: Option<String>,
    pub summary: ImportSummary,
    pub duplicate_summary: ImportDuplicateSummary,
    pub duplicates_preview: ImportDuplicatesPreview,
    pub issues: Vec<ImportIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportNextStep {
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportAction {
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub rows_read: i64,
    pub rows_valid: i64,
    pub rows_invalid: i64,
    pub inserted: i64,
    pub deduped: i64,
}

impl ImportSummary {
    pub fn absorb(&mut self, other: &ImportSummary) {
        self.rows_read += other.rows_read;
        self.rows_valid += other.rows_valid;
        self.rows_invalid += other.rows_invalid;
        self.inserted += other.inserted;
        self.deduped += other.deduped;
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportDuplicateSummary {
    pub total: i64,
    pub batch: i64,
    pub existing_ledger: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportDuplicateRow {
    pub source_row_index: i64,
    pub dedupe_reason: String,
    pub account_key: String,
    pub posted_at: String,
    pub amount: Decimal,
    pub description: String,
    pub matched_batch_row_index: Option<i64>,
    pub matched_txn_id: Option<String>,
    pub matched_import_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportDuplicatesPreview {
    pub returned: i64,
    pub truncated: bool,
    pub rows: Vec<ImportDuplicateRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportIssue {
    pub row: i64,
    pub field: String,
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListData {
    pub rows: Vec<ImportListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListItem {
    pub import_id: String,
    pub account_key: String,
    pub created_at: String,
    pub rows_read: i64,
    pub rows_valid: i64,
    pub rows_invalid: i64,
    pub inserted: i64,
    pub deduped: i64,
    pub source_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountsData {
    pub summary: AccountsSummary,
    pub rows: Vec<AccountRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountsSummary {
    pub account_count: i64,
    pub transaction_count: i64,
    pub earliest_posted_at: Option<String>,
    pub latest_posted_at: Option<String>,
    pub net_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountRow {
    pub account_key: String,
    pub account_type: AccountType,
    pub txn_count: i64,
    pub first_posted_at: Option<String>,
    pub last_posted_at: Option<String>,
    pub net_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeData {
    pub as_of: NaiveDate,
    pub today: NaiveDate,
    pub parameters: SplitParameters,
    pub recent_days: i64,
    pub accounts: Vec<AccountReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub output_path: String,
    pub as_of: NaiveDate,
    pub parameters: SplitParameters,
    pub accounts: Vec<String>,
    pub charts_embedded: Vec<String>,
    pub bytes_written: i64,
}

#[cfg(test)]
mod tests {
    use super::AccountType;

    #[test]
    fn account_type_is_inferred_from_key_tokens() {
        assert_eq!(AccountType::infer_from_key("team_beeb_cc"), AccountType::CreditCard);
        assert_eq!(
            AccountType::infer_from_key("chase_credit_card"),
            AccountType::CreditCard
        );
        assert_eq!(
            AccountType::infer_from_key("team_beeb_checking"),
            AccountType::Checking
        );
        assert_eq!(AccountType::infer_from_key("ally_savings"), AccountType::Savings);
        assert_eq!(AccountType::infer_from_key("brokerage"), AccountType::Other);
        assert_eq!(AccountType::infer_from_key("accident"), AccountType::Other);
    }

    #[test]
    fn stored_values_round_trip_through_parse() {
        for kind in [
            AccountType::Checking,
            AccountType::Savings,
            AccountType::CreditCard,
            AccountType::Other,
        ] {
            assert_eq!(AccountType::parse(kind.as_str()), kind);
        }
    }
}
