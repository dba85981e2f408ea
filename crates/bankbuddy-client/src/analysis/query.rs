use std::path::Path;

use rusqlite::{Connection, params};

use crate::ClientResult;
use crate::analysis::date::parse_transaction_date;
use crate::analysis::types::{AccountRecord, LedgerTransaction};
use crate::contracts::types::AccountType;
use crate::money::from_storage;
use crate::state::map_sqlite_error;

/// Loads transactions in a stable order: account, date, description, amount.
/// Rows with an unparseable date or amount are skipped with a warning.
pub fn load_transactions(
    connection: &Connection,
    db_path: &Path,
    account_key: Option<&str>,
) -> ClientResult<Vec<LedgerTransaction>> {
    let mut statement = connection
        .prepare(
            "SELECT
                txn_id,
                account_key,
                posted_at,
                description,
                amount,
                category
             FROM v1_transactions
             WHERE (?1 IS NULL OR account_key = ?1)
             ORDER BY account_key ASC, posted_at ASC, description ASC, amount ASC, txn_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map(params![account_key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        let (txn_id, account_key, posted_at, description, amount, category) =
            row.map_err(|error| map_sqlite_error(db_path, &error))?;
        let (Some(parsed_date), Some(parsed_amount)) =
            (parse_transaction_date(&posted_at), from_storage(&amount))
        else {
            log::warn!("skipping unreadable stored transaction {txn_id}");
            continue;
        };

        rows.push(LedgerTransaction {
            txn_id,
            account_key,
            posted_at: parsed_date,
            description,
            amount: parsed_amount,
            category: category
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        });
    }

    Ok(rows)
}

/// Accounts that hold at least one transaction, ordered by key.
pub fn load_accounts(connection: &Connection, db_path: &Path) -> ClientResult<Vec<AccountRecord>> {
    let mut statement = connection
        .prepare(
            "SELECT account_key, account_type
             FROM v1_accounts
             WHERE txn_count > 0
             ORDER BY account_key ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows_iter = statement
        .query_map([], |row| {
            Ok(AccountRecord {
                account_key: row.get(0)?,
                account_type: AccountType::parse(&row.get::<_, String>(1)?),
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(rows)
}
