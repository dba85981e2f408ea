use rust_decimal::Decimal;

use crate::analysis::date::format_iso_date;
use crate::analysis::types::DateRange;
use crate::money::format_dollar;
use crate::report::{AccountReport, ReportData, ReportOptions};
use crate::split::{Allocation, CategoryShare};

const SECTION_BREAK: &str = "---";

/// Renders the full Markdown report. Output depends only on `data` and
/// `options`; the footer carries `options.generated_at`.
pub fn render_markdown(data: &ReportData, options: &ReportOptions) -> String {
    let mut lines: Vec<String> = Vec::new();

    write_overview(&mut lines, data);
    write_account_summaries(&mut lines, data);
    write_category_spending(&mut lines, data);
    write_cash_flow(&mut lines, data);
    write_monthly_trends(&mut lines, data);
    write_balance_analysis(&mut lines, data, options);
    write_new_expenses(&mut lines, data, options);
    write_recent_activity(&mut lines, data, options);

    lines.push(SECTION_BREAK.to_string());
    lines.push(String::new());
    lines.push(format!("*Report generated on: {}*", options.generated_at));

    let mut document = lines.join("\n");
    document.push('\n');
    document
}

fn write_overview(lines: &mut Vec<String>, data: &ReportData) {
    lines.push("# Bank Accounts Transaction Report".to_string());
    lines.push(String::new());
    lines.push("## Overview".to_string());
    lines.push(
        "This report summarizes key insights and statistics for your bank accounts, \
         based on the latest imported transaction data."
            .to_string(),
    );
    lines.push(String::new());
    lines.push(format!("- **Accounts:** {}", data.accounts.len()));
    lines.push(format!("- **Data through:** {}", format_iso_date(&data.as_of)));
    end_section(lines);
}

fn write_account_summaries(lines: &mut Vec<String>, data: &ReportData) {
    lines.push("## Account Summaries".to_string());
    lines.push(String::new());
    if data.accounts.is_empty() {
        lines.push("No accounts imported yet.".to_string());
        end_section(lines);
        return;
    }

    lines.push(table_header(&[
        "Account",
        "Total Transactions",
        "Total Amount",
        "Largest Transaction",
        "Smallest Transaction",
        "Most Frequent Category",
        "Date Range",
    ]));
    for account in &data.accounts {
        let summary = &account.summary;
        lines.push(table_row(&[
            account.heading(),
            summary.total_transactions.to_string(),
            format_dollar(summary.total_amount),
            optional_dollar(summary.largest_transaction),
            optional_dollar(summary.smallest_transaction),
            summary
                .most_frequent_category
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
            range_text(summary.date_range.as_ref()),
        ]));
    }
    end_section(lines);
}

fn write_category_spending(lines: &mut Vec<String>, data: &ReportData) {
    lines.push("## Spending by Category".to_string());
    lines.push(String::new());

    for account in &data.accounts {
        lines.push(format!("### {}", account.heading()));
        lines.push(String::new());
        lines.push(table_header(&["Category", "Transactions", "Total"]));
        for category in &account.categories {
            lines.push(table_row(&[
                category.category.clone(),
                category.count.to_string(),
                format_dollar(category.total),
            ]));
        }
        lines.push(table_row(&[
            "**Total**".to_string(),
            format!("**{}**", account.summary.total_transactions),
            format!("**{}**", format_dollar(account.summary.total_amount)),
        ]));
        lines.push(String::new());
    }
    end_section(lines);
}

fn write_cash_flow(lines: &mut Vec<String>, data: &ReportData) {
    lines.push("## Deposits & Withdrawals".to_string());
    lines.push(String::new());
    lines.push(table_header(&[
        "Account",
        "Deposits",
        "Withdrawals",
        "Net",
        "Deposit Count",
        "Withdrawal Count",
    ]));
    for account in &data.accounts {
        let flow = &account.cash_flow;
        lines.push(table_row(&[
            account.heading(),
            format_dollar(flow.deposits),
            format_dollar(flow.withdrawals),
            format_dollar(flow.net),
            flow.deposit_count.to_string(),
            flow.withdrawal_count.to_string(),
        ]));
    }
    end_section(lines);
}

fn write_monthly_trends(lines: &mut Vec<String>, data: &ReportData) {
    lines.push("## Monthly Trends".to_string());
    lines.push(String::new());
    for account in &data.accounts {
        lines.push(format!("### {}", account.heading()));
        lines.push(String::new());
        lines.push(table_header(&[
            "Month",
            "Deposits",
            "Withdrawals",
            "Net",
            "Transactions",
        ]));
        for trend in &account.monthly_trends {
            lines.push(table_row(&[
                trend.month.clone(),
                format_dollar(trend.deposits),
                format_dollar(trend.withdrawals),
                format_dollar(trend.net),
                trend.count.to_string(),
            ]));
        }
        lines.push(String::new());
    }
    end_section(lines);
}

fn write_balance_analysis(lines: &mut Vec<String>, data: &ReportData, options: &ReportOptions) {
    let parties = &options.parties;
    let person1 = &parties.person1_name;
    let person2 = &parties.person2_name;
    let person1_pct = parties.ratio.person1_percentage();
    let person2_pct = parties.ratio.person2_percentage();

    lines.push("## Current Balance Analysis".to_string());
    lines.push(String::new());
    lines.push(format!(
        "**Split Ratio:** {person1} {person1_pct}% / {person2} {person2_pct}%"
    ));
    lines.push(String::new());
    lines.push(
        "*This section shows the total balance of each account and how it splits at the agreed percentage.*"
            .to_string(),
    );
    lines.push(String::new());

    let mut combined_balance = Decimal::ZERO;
    let mut combined_person1 = Decimal::ZERO;
    let mut combined_person2 = Decimal::ZERO;

    for account in &data.accounts {
        let split = &account.balance_split;
        combined_balance += split.total_balance;
        combined_person1 += split.balance_shares.person1;
        combined_person2 += split.balance_shares.person2;

        lines.push(format!("### {} Current Balance", account.heading()));
        lines.push(format!(
            "- **Total Balance:** {}",
            format_dollar(split.total_balance)
        ));
        lines.push(format!(
            "- **Total Expenses (All Time):** {}",
            format_dollar(split.total_expenses)
        ));
        lines.push(format!(
            "- **Total Payments & Credits:** {}",
            format_dollar(split.total_payments_credits)
        ));
        lines.push(format!(
            "- **{person1} Share:** {}",
            format_dollar(split.balance_shares.person1)
        ));
        lines.push(format!(
            "- **{person2} Share:** {}",
            format_dollar(split.balance_shares.person2)
        ));
        lines.push(String::new());

        lines.push("#### Recent Payments".to_string());
        let payments = &account.payment_patterns.recent_payments;
        if payments.is_empty() {
            lines.push("No recent payments found".to_string());
        } else {
            lines.push(table_header(&["Date", "Amount", "Description"]));
            for payment in payments {
                lines.push(table_row(&[
                    format_iso_date(&payment.posted_at),
                    format_dollar(payment.amount),
                    payment.description.clone(),
                ]));
            }
        }
        lines.push(String::new());

        lines.push("#### Expense Breakdown (All Time)".to_string());
        lines.extend(share_table(
            &split.category_breakdown,
            split.total_expenses,
            split.expense_shares,
            options,
        ));
        lines.push(String::new());
    }

    lines.push("### Settlement Summary".to_string());
    lines.push(format!(
        "**Total Current Balance Across All Accounts:** {}",
        format_dollar(combined_balance)
    ));
    lines.push(String::new());
    lines.push(format!(
        "- **{person1} Share:** {}",
        format_dollar(combined_person1)
    ));
    lines.push(format!(
        "- **{person2} Share:** {}",
        format_dollar(combined_person2)
    ));
    end_section(lines);
}

fn write_new_expenses(lines: &mut Vec<String>, data: &ReportData, options: &ReportOptions) {
    let person1 = &options.parties.person1_name;
    let person2 = &options.parties.person2_name;

    lines.push("## New Expenses Since Last Settlement".to_string());
    lines.push(String::new());
    lines.push(
        "*This section shows only new shared expenses since the last detected settlement.*"
            .to_string(),
    );
    lines.push(String::new());

    for account in &data.accounts {
        let split = &account.expense_split;
        lines.push(format!("### {} New Expenses", account.heading()));
        lines.push(format!("- **Period:** {}", split.period));
        lines.push(format!(
            "- **New Expenses:** {}",
            format_dollar(split.total_expenses)
        ));
        lines.push(format!(
            "- **{person1} Share:** {}",
            format_dollar(split.shares.person1)
        ));
        lines.push(format!(
            "- **{person2} Share:** {}",
            format_dollar(split.shares.person2)
        ));
        lines.push(format!("- **Expense Transactions:** {}", split.expense_count));
        if let Some(range) = &split.date_range {
            lines.push(format!("- **Date Range:** {}", range_text(Some(range))));
        }
        lines.push(String::new());

        if !split.category_breakdown.is_empty() {
            lines.push("#### New Expense Breakdown".to_string());
            lines.extend(share_table(
                &split.category_breakdown,
                split.total_expenses,
                split.shares,
                options,
            ));
            lines.push(String::new());
        }

        if !split.settlements.is_empty() {
            lines.push("#### Detected Settlements".to_string());
            lines.push(table_header(&[
                "Date",
                "Amount Paid",
                "Balance Before",
                "Transfers",
            ]));
            for settlement in &split.settlements {
                lines.push(table_row(&[
                    format_iso_date(&settlement.settled_on),
                    format_dollar(settlement.amount),
                    format_dollar(settlement.outstanding_before),
                    settlement.txn_ids.len().to_string(),
                ]));
            }
            lines.push(String::new());
        }
    }
    end_section(lines);
}

fn write_recent_activity(lines: &mut Vec<String>, data: &ReportData, options: &ReportOptions) {
    lines.push(format!(
        "## Recent Activity (Last {} Days)",
        options.recent_days
    ));
    lines.push(String::new());

    for account in &data.accounts {
        let recent = &account.recent_activity;
        lines.push(format!("### {}", account.heading()));
        lines.push(format!(
            "- **Number of Transactions:** {}",
            recent.transaction_count
        ));
        lines.push(format!(
            "- **Total Amount:** {}",
            format_dollar(recent.total_amount)
        ));
        lines.push("- **Top 3 Categories:**".to_string());
        lines.push(String::new());
        if recent.top_categories.is_empty() {
            lines.push("No recent transactions".to_string());
        } else {
            lines.push(table_header(&["Category", "Count"]));
            for category in &recent.top_categories {
                lines.push(table_row(&[
                    category.category.clone(),
                    category.count.to_string(),
                ]));
            }
        }
        lines.push(String::new());

        if let Some(link) = options.charts.get(&account.account_key) {
            lines.push(format!(
                "![{} Top Categories Chart]({link})",
                account.account_type.label()
            ));
            lines.push(String::new());
        }
    }
}

fn share_table(
    breakdown: &[CategoryShare],
    total: Decimal,
    total_shares: Allocation,
    options: &ReportOptions,
) -> Vec<String> {
    if breakdown.is_empty() {
        return vec!["No expense data available".to_string()];
    }

    let parties = &options.parties;
    let person1_header = format!(
        "{} ({}%)",
        parties.person1_name,
        parties.ratio.person1_percentage()
    );
    let person2_header = format!(
        "{} ({}%)",
        parties.person2_name,
        parties.ratio.person2_percentage()
    );

    let mut rows = vec![table_header(&[
        "Category",
        "Total Amount",
        &person1_header,
        &person2_header,
    ])];
    for share in breakdown {
        rows.push(table_row(&[
            share.category.clone(),
            format_dollar(share.total),
            format_dollar(share.shares.person1),
            format_dollar(share.shares.person2),
        ]));
    }
    rows.push(table_row(&[
        "**TOTAL EXPENSES**".to_string(),
        format!("**{}**", format_dollar(total)),
        format!("**{}**", format_dollar(total_shares.person1)),
        format!("**{}**", format_dollar(total_shares.person2)),
    ]));
    rows
}

fn table_header(columns: &[&str]) -> String {
    let header = table_row(
        &columns
            .iter()
            .map(|column| column.to_string())
            .collect::<Vec<String>>(),
    );
    let separator = format!("|{}", "---|".repeat(columns.len()));
    format!("{header}\n{separator}")
}

fn table_row(cells: &[String]) -> String {
    let escaped = cells
        .iter()
        .map(|cell| escape_cell(cell))
        .collect::<Vec<String>>();
    format!("| {} |", escaped.join(" | "))
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn optional_dollar(value: Option<Decimal>) -> String {
    value.map(format_dollar).unwrap_or_else(|| "N/A".to_string())
}

fn range_text(range: Option<&DateRange>) -> String {
    match range {
        Some(range) => format!(
            "{} to {}",
            format_iso_date(&range.start),
            format_iso_date(&range.end)
        ),
        None => "N/A to N/A".to_string(),
    }
}

fn end_section(lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push(SECTION_BREAK.to_string());
    lines.push(String::new());
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{escape_cell, render_markdown};
    use crate::analysis::types::{AccountRecord, LedgerTransaction};
    use crate::contracts::types::AccountType;
    use crate::report::{ReportOptions, gather};
    use crate::split::SplitParties;

    fn txn(id: &str, account: &str, day: u32, description: &str, cents: i64) -> LedgerTransaction {
        LedgerTransaction {
            txn_id: id.to_string(),
            account_key: account.to_string(),
            posted_at: NaiveDate::from_ymd_opt(2025, 3, day).unwrap_or(NaiveDate::MIN),
            description: description.to_string(),
            amount: Decimal::new(cents, 2),
            category: Some("Dining".to_string()),
        }
    }

    fn options(charts: BTreeMap<String, String>) -> ReportOptions {
        ReportOptions {
            parties: SplitParties::default(),
            recent_days: 30,
            as_of: NaiveDate::from_ymd_opt(2025, 3, 20).unwrap_or(NaiveDate::MIN),
            generated_at: "2025-03-21 09:00:00".to_string(),
            charts,
        }
    }

    fn render(charts: BTreeMap<String, String>) -> String {
        let accounts = vec![
            AccountRecord {
                account_key: "team_cc".to_string(),
                account_type: AccountType::CreditCard,
            },
            AccountRecord {
                account_key: "team_checking".to_string(),
                account_type: AccountType::Checking,
            },
        ];
        let rows = vec![
            txn("a", "team_cc", 2, "TACOS | BAR", -2001),
            txn("b", "team_cc", 9, "PAYMENT THANK YOU", 2001),
            txn("c", "team_checking", 4, "PAYROLL", 150000),
        ];
        let opts = options(charts);
        let data = gather(&accounts, &rows, &opts.parties, 30, opts.as_of, opts.as_of);
        render_markdown(&data, &opts)
    }

    #[test]
    fn renders_every_section_in_order() {
        let document = render(BTreeMap::new());
        let headings = [
            "# Bank Accounts Transaction Report",
            "## Account Summaries",
            "## Spending by Category",
            "## Deposits & Withdrawals",
            "## Monthly Trends",
            "## Current Balance Analysis",
            "### Settlement Summary",
            "## New Expenses Since Last Settlement",
            "## Recent Activity (Last 30 Days)",
            "*Report generated on: 2025-03-21 09:00:00*",
        ];
        let mut cursor = 0;
        for heading in headings {
            let found = document[cursor..].find(heading);
            assert!(found.is_some(), "missing or out of order: {heading}");
            if let Some(offset) = found {
                cursor += offset;
            }
        }
        assert!(document.contains("| Credit Card (team_cc) | 2 | $0.00 |"));
        assert!(document.contains("**Split Ratio:** Person 1 50% / Person 2 50%"));
        assert!(document.contains("TACOS \\| BAR"));
        assert!(document.contains("- **Period:** Since last settlement on 2025-03-09"));
    }

    #[test]
    fn charts_are_embedded_only_when_supplied() {
        let without = render(BTreeMap::new());
        assert!(!without.contains("!["));

        let mut charts = BTreeMap::new();
        charts.insert(
            "team_cc".to_string(),
            "./team_cc_top_categories.png".to_string(),
        );
        let with = render(charts);
        assert!(with.contains("![Credit Card Top Categories Chart](./team_cc_top_categories.png)"));
        assert_eq!(with.matches("![").count(), 1);
    }

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(render(BTreeMap::new()), render(BTreeMap::new()));
    }

    #[test]
    fn cells_escape_pipes_and_newlines() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }
}
