use std::io;

use bankbuddy_client::contracts::types::AccountType;
use serde_json::Value;

use super::format::{self, Column};

pub fn render_accounts(data: &Value) -> io::Result<String> {
    let summary = data
        .get("summary")
        .filter(|value| value.is_object())
        .ok_or_else(|| io::Error::other("account list output requires summary"))?;
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("account list output requires rows"))?;

    let mut lines = vec!["Ledger accounts:".to_string(), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Accounts:", format::int(summary, "account_count").to_string()),
            (
                "Transactions:",
                format::int(summary, "transaction_count").to_string(),
            ),
            (
                "Covers:",
                date_span(summary, "earliest_posted_at", "latest_posted_at"),
            ),
            ("Net amount:", format::dollars(summary, "net_amount")),
        ],
        2,
    ));

    if rows.is_empty() {
        lines.push(String::new());
        lines.push("No accounts found yet.".to_string());
        lines.push(String::new());
        lines.push("Import a bank export first:".to_string());
        lines.push("  1. buddy import create --help".to_string());
        lines.push("  2. buddy import create --dry-run <path>".to_string());
        lines.push("  3. buddy import create <path>".to_string());
        return Ok(lines.join("\n"));
    }

    let columns = [
        Column::left("Account"),
        Column::left("Type"),
        Column::right("Txns"),
        Column::left("First"),
        Column::left("Last"),
        Column::right("Net"),
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                format::text(row, "account_key"),
                type_label(row),
                format::int(row, "txn_count").to_string(),
                format::text(row, "first_posted_at"),
                format::text(row, "last_posted_at"),
                format::dollars(row, "net_amount"),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    lines.push(String::new());
    lines.extend(format::render_table(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Account",
    ));
    Ok(lines.join("\n"))
}

/// `Credit Card` for a serialized `credit_card`.
pub fn type_label(row: &Value) -> String {
    let raw = row
        .get("account_type")
        .and_then(Value::as_str)
        .unwrap_or("other");
    AccountType::parse(raw).label().to_string()
}

fn date_span(value: &Value, start_key: &str, end_key: &str) -> String {
    match (
        value.get(start_key).and_then(Value::as_str),
        value.get(end_key).and_then(Value::as_str),
    ) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => "no transactions".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_accounts;

    #[test]
    fn renders_account_table() {
        let data = json!({
            "summary": {
                "account_count": 1,
                "transaction_count": 3,
                "earliest_posted_at": "2025-01-05",
                "latest_posted_at": "2025-01-20",
                "net_amount": "-67.10"
            },
            "rows": [{
                "account_key": "joint_cc",
                "account_type": "credit_card",
                "txn_count": 3,
                "first_posted_at": "2025-01-05",
                "last_posted_at": "2025-01-20",
                "net_amount": "-67.10"
            }]
        });

        let rendered = render_accounts(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("Covers:        2025-01-05 to 2025-01-20"));
            assert!(text.contains("joint_cc"));
            assert!(text.contains("Credit Card"));
            assert!(text.contains("-$67.10"));
        }
    }

    #[test]
    fn empty_ledger_points_at_import() {
        let data = json!({
            "summary": {
                "account_count": 0,
                "transaction_count": 0,
                "earliest_posted_at": null,
                "latest_posted_at": null,
                "net_amount": "0.00"
            },
            "rows": []
        });

        let rendered = render_accounts(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("No accounts found yet."));
            assert!(text.contains("buddy import create --dry-run <path>"));
        }
    }
}
