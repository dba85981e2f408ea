use std::io;

use serde_json::Value;

use super::accounts_text::type_label;
use super::format::{self, Column};

const TOP_CATEGORY_LIMIT: usize = 5;

pub fn render_analyze(data: &Value) -> io::Result<String> {
    let accounts = data
        .get("accounts")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("analyze output requires accounts"))?;
    let parameters = data.get("parameters").cloned().unwrap_or(Value::Null);
    let person1 = format::text(&parameters, "person1_name");
    let person2 = format::text(&parameters, "person2_name");

    let mut lines = vec![
        format!(
            "Analysis as of {} ({} account{}).",
            format::text(data, "as_of"),
            accounts.len(),
            if accounts.len() == 1 { "" } else { "s" }
        ),
        format!(
            "Split: {person1} {}% / {person2} {}%",
            format::text(&parameters, "person1_percentage"),
            format::text(&parameters, "person2_percentage"),
        ),
    ];

    for account in accounts {
        lines.push(String::new());
        lines.extend(render_account(account, &person1, &person2));
    }

    lines.push(String::new());
    lines.push("Next step:".to_string());
    lines.push("  Write the full Markdown report:".to_string());
    lines.push("  buddy report".to_string());
    Ok(lines.join("\n"))
}

fn render_account(account: &Value, person1: &str, person2: &str) -> Vec<String> {
    let summary = account.get("summary").cloned().unwrap_or(Value::Null);
    let cash_flow = account.get("cash_flow").cloned().unwrap_or(Value::Null);
    let recent = account.get("recent_activity").cloned().unwrap_or(Value::Null);
    let balance = account.get("balance_split").cloned().unwrap_or(Value::Null);
    let since = account.get("expense_split").cloned().unwrap_or(Value::Null);

    let heading = format!(
        "{} ({})",
        type_label(account),
        format::text(account, "account_key")
    );
    let mut lines = vec![heading.clone(), "=".repeat(heading.chars().count())];

    lines.extend(format::key_value_rows(
        &[
            (
                "Transactions:",
                format::int(&summary, "total_transactions").to_string(),
            ),
            ("Date range:", format::range(&summary, "date_range")),
            ("Net amount:", format::dollars(&summary, "total_amount")),
            ("Deposits:", format::dollars(&cash_flow, "deposits")),
            ("Withdrawals:", format::dollars(&cash_flow, "withdrawals")),
            (
                "Top category:",
                format::text(&summary, "most_frequent_category"),
            ),
            (
                "Recent activity:",
                format!(
                    "{} transactions, {} in the last {} days",
                    format::int(&recent, "transaction_count"),
                    format::dollars(&recent, "total_amount"),
                    format::int(&recent, "days"),
                ),
            ),
        ],
        2,
    ));

    if let Some(quality) = summary.get("data_quality") {
        let future = format::int(quality, "future_count");
        if future > 0 {
            lines.push(format!(
                "  Note: {future} transaction(s) are dated after today."
            ));
        }
    }

    let categories = format::array(account, "categories");
    if !categories.is_empty() {
        lines.push(String::new());
        lines.push("Spending by category:".to_string());
        let rows = categories
            .iter()
            .take(TOP_CATEGORY_LIMIT)
            .map(|category| {
                vec![
                    format::text(category, "category"),
                    format::int(category, "count").to_string(),
                    format::dollars(category, "total"),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table(
            &[
                Column::left("Category"),
                Column::right("Count"),
                Column::right("Total"),
            ],
            &rows,
            format::terminal_width(),
            "Category",
        ));
        if categories.len() > TOP_CATEGORY_LIMIT {
            lines.push(format!(
                "  ...and {} more in the report.",
                categories.len() - TOP_CATEGORY_LIMIT
            ));
        }
    }

    lines.push(String::new());
    lines.push("All-time shared expenses:".to_string());
    lines.extend(allocation_rows(
        &balance,
        "total_expenses",
        "expense_shares",
        person1,
        person2,
    ));

    lines.push(String::new());
    lines.push(format!(
        "Since last settlement ({}):",
        format::text(&since, "period")
    ));
    lines.extend(allocation_rows(
        &since,
        "total_expenses",
        "shares",
        person1,
        person2,
    ));
    lines.extend(format::key_value_rows(
        &[("Outstanding:", format::dollars(&since, "outstanding"))],
        2,
    ));

    let settlements = format::array(&since, "settlements");
    if !settlements.is_empty() {
        lines.push(String::new());
        lines.push("Detected settlements:".to_string());
        let rows = settlements
            .iter()
            .map(|settlement| {
                vec![
                    format::text(settlement, "settled_on"),
                    format::dollars(settlement, "amount"),
                    format::dollars(settlement, "outstanding_before"),
                    format::dollars(settlement, "residual"),
                ]
            })
            .collect::<Vec<Vec<String>>>();
        lines.extend(format::render_table(
            &[
                Column::left("Date"),
                Column::right("Amount"),
                Column::right("Owed before"),
                Column::right("Residual"),
            ],
            &rows,
            format::terminal_width(),
            "Settlement",
        ));
    }

    lines
}

fn allocation_rows(
    split: &Value,
    total_key: &str,
    shares_key: &str,
    person1: &str,
    person2: &str,
) -> Vec<String> {
    let shares = split.get(shares_key).cloned().unwrap_or(Value::Null);
    let person1_label = format!("{person1}:");
    let person2_label = format!("{person2}:");
    format::key_value_rows(
        &[
            ("Total:", format::dollars(split, total_key)),
            (person1_label.as_str(), format::dollars(&shares, "person1")),
            (person2_label.as_str(), format::dollars(&shares, "person2")),
        ],
        2,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::render_analyze;

    #[test]
    fn renders_split_and_settlements_per_account() {
        let data = json!({
            "as_of": "2025-01-31",
            "today": "2025-02-01",
            "recent_days": 30,
            "parameters": {
                "person1_name": "Alex",
                "person2_name": "Sam",
                "person1_percentage": "60",
                "person2_percentage": "40",
                "settlement_policy": "v1"
            },
            "accounts": [{
                "account_key": "joint_cc",
                "account_type": "credit_card",
                "summary": {
                    "total_transactions": 3,
                    "total_amount": "-67.10",
                    "date_range": {"start": "2025-01-05", "end": "2025-01-20"},
                    "most_frequent_category": "Groceries",
                    "data_quality": {"future_count": 0}
                },
                "categories": [
                    {"category": "Utilities", "total": "-80.00", "count": 1},
                    {"category": "Groceries", "total": "-54.20", "count": 1}
                ],
                "cash_flow": {"deposits": "67.10", "withdrawals": "-134.20", "net": "-67.10"},
                "recent_activity": {"days": 30, "transaction_count": 3, "total_amount": "-67.10"},
                "balance_split": {
                    "total_expenses": "134.20",
                    "expense_shares": {"person1": "80.52", "person2": "53.68"}
                },
                "expense_split": {
                    "period": "Since 2025-01-20",
                    "total_expenses": "0.00",
                    "shares": {"person1": "0.00", "person2": "0.00"},
                    "outstanding": "0.00",
                    "settlements": [{
                        "settled_on": "2025-01-20",
                        "amount": "134.20",
                        "outstanding_before": "134.20",
                        "residual": "0.00",
                        "txn_ids": ["txn_3"]
                    }]
                }
            }]
        });

        let rendered = render_analyze(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Analysis as of 2025-01-31 (1 account)."));
            assert!(text.contains("Split: Alex 60% / Sam 40%"));
            assert!(text.contains("Credit Card (joint_cc)"));
            assert!(text.contains("$80.52"));
            assert!(text.contains("Since last settlement (Since 2025-01-20):"));
            assert!(text.contains("Detected settlements:"));
            assert!(text.contains("2025-01-20"));
        }
    }

    #[test]
    fn missing_accounts_is_an_error() {
        assert!(render_analyze(&json!({})).is_err());
    }
}
