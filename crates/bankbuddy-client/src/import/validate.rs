use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::analysis::date::{format_iso_date, parse_export_date};
use crate::contracts::types::{ImportIssue, ImportSummary};
use crate::import::CanonicalTransaction;
use crate::import::parse::{ParsedFile, ParsedRow, RawAmount};
use crate::money::{AmountParseError, parse_amount};

#[derive(Debug, Clone)]
pub(crate) struct ValidRow {
    pub(crate) source_row_index: i64,
    pub(crate) transaction: CanonicalTransaction,
}

#[derive(Debug, Clone)]
pub(crate) struct ValidatedRows {
    pub(crate) rows: Vec<ValidRow>,
    pub(crate) issues: Vec<ImportIssue>,
    pub(crate) summary: ImportSummary,
}

/// Normalizes parsed rows for one account. Rows with any issue are dropped
/// and reported; they never fail the import.
pub(crate) fn validate_rows(source_ref: &str, account_key: &str, parsed: ParsedFile) -> ValidatedRows {
    let rows_read = parsed.rows_read();
    let mut issues = parsed.issues;
    let mut rows = Vec::new();

    for raw in parsed.rows {
        let mut row_issues = Vec::new();
        let row_index = raw.row;
        if let Some(transaction) = validate_row(account_key, raw, &mut row_issues) {
            rows.push(ValidRow {
                source_row_index: row_index,
                transaction,
            });
        } else {
            for issue in &row_issues {
                log::warn!(
                    "skipping row {} in {source_ref}: {}",
                    issue.row,
                    issue.description
                );
            }
            issues.extend(row_issues);
        }
    }

    let rows_invalid = issues
        .iter()
        .map(|issue| issue.row)
        .collect::<BTreeSet<i64>>()
        .len() as i64;

    ValidatedRows {
        summary: ImportSummary {
            rows_read,
            rows_valid: rows.len() as i64,
            rows_invalid,
            inserted: 0,
            deduped: 0,
        },
        rows,
        issues,
    }
}

fn validate_row(
    account_key: &str,
    raw: ParsedRow,
    issues: &mut Vec<ImportIssue>,
) -> Option<CanonicalTransaction> {
    let posted_at = validate_date(raw.row, raw.posted_at, issues);
    let description = match raw.description.as_deref().map(collapse_whitespace) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            issues.push(ImportIssue {
                row: raw.row,
                field: "description".to_string(),
                code: "missing_required_field".to_string(),
                description: "description must be present and non-empty.".to_string(),
                expected: Some("non-empty text".to_string()),
                received: Some(String::new()),
            });
            None
        }
    };
    let amount = validate_amount(raw.row, raw.amount, issues);

    let (Some(posted_at), Some(description), Some(amount)) = (posted_at, description, amount)
    else {
        return None;
    };

    Some(CanonicalTransaction {
        account_key: account_key.to_string(),
        posted_at,
        description,
        amount,
        category: normalize_optional(raw.category),
        original_description: normalize_optional(raw.original_description),
        status: normalize_optional(raw.status),
    })
}

fn validate_date(row: i64, value: Option<String>, issues: &mut Vec<ImportIssue>) -> Option<String> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(ImportIssue {
            row,
            field: "date".to_string(),
            code: "missing_required_field".to_string(),
            description: "date must be present and non-empty.".to_string(),
            expected: Some("YYYY-MM-DD or MM/DD/YYYY".to_string()),
            received: Some(String::new()),
        });
        return None;
    };

    match parse_export_date(&candidate) {
        Some(date) => Some(format_iso_date(&date)),
        None => {
            issues.push(ImportIssue {
                row,
                field: "date".to_string(),
                code: "invalid_date".to_string(),
                description: format!("date must be a real calendar date; got \"{candidate}\""),
                expected: Some("YYYY-MM-DD or MM/DD/YYYY".to_string()),
                received: Some(candidate),
            });
            None
        }
    }
}

fn validate_amount(row: i64, value: RawAmount, issues: &mut Vec<ImportIssue>) -> Option<Decimal> {
    let (candidate, parsed) = match value {
        RawAmount::Signed(raw) => {
            let raw = raw.unwrap_or_default();
            let parsed = parse_amount(&raw);
            (raw, parsed)
        }
        RawAmount::DebitCredit { debit, credit } => match (debit, credit) {
            (Some(debit), _) => {
                let parsed = parse_amount(&debit).map(|amount| -amount.abs());
                (debit, parsed)
            }
            (None, Some(credit)) => {
                let parsed = parse_amount(&credit).map(|amount| amount.abs());
                (credit, parsed)
            }
            (None, None) => (String::new(), Err(AmountParseError::Empty)),
        },
    };

    match parsed {
        Ok(amount) => Some(amount),
        Err(error) => {
            issues.push(ImportIssue {
                row,
                field: "amount".to_string(),
                code: error.code().to_string(),
                description: format!("{error}."),
                expected: Some("number with at most 2 decimal places (e.g. -42.15)".to_string()),
                received: Some(candidate),
            });
            None
        }
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<&str>>().join(" ")
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::validate_rows;
    use crate::import::parse::parse_csv;

    #[test]
    fn malformed_rows_are_reported_and_skipped() {
        let content = "Date,Description,Amount\n\
                       01/05/2025,  COFFEE   SHOP ,\"$1,004.50\"\n\
                       13/45/2025,BAD DATE,-1.00\n\
                       2025-01-07,,-2.00\n\
                       2025-01-08,PRECISE,-1.005\n\
                       2025-01-09,REFUND,(12.34)\n";
        let parsed = parse_csv("cc.csv", content);
        assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            let validated = validate_rows("cc.csv", "team_cc", parsed);
            assert_eq!(validated.summary.rows_read, 5);
            assert_eq!(validated.summary.rows_valid, 2);
            assert_eq!(validated.summary.rows_invalid, 3);

            let codes = validated
                .issues
                .iter()
                .map(|issue| issue.code.as_str())
                .collect::<Vec<&str>>();
            assert_eq!(
                codes,
                vec!["invalid_date", "missing_required_field", "invalid_amount_scale"]
            );

            let first = &validated.rows[0].transaction;
            assert_eq!(first.posted_at, "2025-01-05");
            assert_eq!(first.description, "COFFEE SHOP");
            assert_eq!(first.amount, Decimal::new(100450, 2));
            assert_eq!(validated.rows[1].transaction.amount, Decimal::new(-1234, 2));
            assert_eq!(validated.rows[1].source_row_index, 5);
        }
    }

    #[test]
    fn debit_and_credit_columns_set_the_sign() {
        let content = "Date,Description,Debit,Credit\n2025-02-01,RENT,1200.00,\n2025-02-02,PAY,,-50\n";
        let parsed = parse_csv("checking.csv", content);
        assert!(parsed.is_ok());
        if let Ok(parsed) = parsed {
            let validated = validate_rows("checking.csv", "checking", parsed);
            assert_eq!(validated.rows[0].transaction.amount, Decimal::new(-120000, 2));
            assert_eq!(validated.rows[1].transaction.amount, Decimal::new(5000, 2));
        }
    }
}
