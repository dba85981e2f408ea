use std::path::Path;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::ClientResult;
use crate::analysis::date::format_iso_date;
use crate::analysis::query::{load_accounts, load_transactions};
use crate::analysis::types::{DateRange, LedgerTransaction};
use crate::commands::common::load_setup;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{AccountRow, AccountsData, AccountsSummary};
use crate::money::canonical;
use crate::state::open_connection;

pub fn run() -> ClientResult<SuccessEnvelope> {
    run_with_home_override(None)
}

#[doc(hidden)]
pub fn run_with_home_override(home_override: Option<&Path>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(home_override)?;
    let connection = open_connection(&setup.db_path)?;
    let data = query_accounts_data(&connection, &setup.db_path)?;
    success("account list", data)
}

/// Nets are summed as decimals in Rust; SQLite would sum the text amounts
/// as floats.
pub(crate) fn query_accounts_data(
    connection: &Connection,
    db_path: &Path,
) -> ClientResult<AccountsData> {
    let accounts = load_accounts(connection, db_path)?;
    let transactions = load_transactions(connection, db_path, None)?;

    let rows = accounts
        .iter()
        .map(|account| {
            let owned = transactions
                .iter()
                .filter(|transaction| transaction.account_key == account.account_key)
                .collect::<Vec<&LedgerTransaction>>();
            let range = DateRange::of(owned.iter().map(|transaction| transaction.posted_at));
            AccountRow {
                account_key: account.account_key.clone(),
                account_type: account.account_type,
                txn_count: owned.len() as i64,
                first_posted_at: range.as_ref().map(|range| format_iso_date(&range.start)),
                last_posted_at: range.as_ref().map(|range| format_iso_date(&range.end)),
                net_amount: canonical(owned.iter().map(|transaction| transaction.amount).sum()),
            }
        })
        .collect::<Vec<AccountRow>>();

    let range = DateRange::of(transactions.iter().map(|transaction| transaction.posted_at));
    let summary = AccountsSummary {
        account_count: rows.len() as i64,
        transaction_count: transactions.len() as i64,
        earliest_posted_at: range.as_ref().map(|range| format_iso_date(&range.start)),
        latest_posted_at: range.as_ref().map(|range| format_iso_date(&range.end)),
        net_amount: canonical(
            transactions
                .iter()
                .map(|transaction| transaction.amount)
                .sum::<Decimal>(),
        ),
    };

    Ok(AccountsData { summary, rows })
}
