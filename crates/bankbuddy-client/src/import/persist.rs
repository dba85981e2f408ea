use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Transaction, params};
use ulid::Ulid;

use crate::ClientResult;
use crate::contracts::types::AccountType;
use crate::import::CanonicalTransaction;
use crate::import::validate::ValidRow;
use crate::money::to_storage;
use crate::state::map_sqlite_error;

#[derive(Debug, Clone)]
pub(crate) struct PersistResult {
    pub(crate) import_id: String,
    pub(crate) inserted: i64,
}

pub(crate) struct PersistInput<'a> {
    pub(crate) account_key: &'a str,
    pub(crate) account_type: AccountType,
    pub(crate) rows: &'a [ValidRow],
    pub(crate) rows_read: i64,
    pub(crate) rows_valid: i64,
    pub(crate) rows_invalid: i64,
    pub(crate) deduped: i64,
    pub(crate) source_ref: &'a str,
}

/// Writes one file's rows and its import run. The caller owns the
/// transaction and decides whether to commit.
pub(crate) fn persist_file(
    transaction: &Transaction<'_>,
    db_path: &Path,
    input: PersistInput<'_>,
) -> ClientResult<PersistResult> {
    let import_id = format!("imp_{}", Ulid::new());
    let timestamp = now_timestamp();

    upsert_account(transaction, db_path, input.account_key, input.account_type, &timestamp)?;

    let mut inserted = 0_i64;
    for row in input.rows {
        insert_transaction(transaction, db_path, &import_id, &row.transaction)?;
        inserted += 1;
    }

    transaction
        .execute(
            "INSERT INTO internal_import_runs (
                import_id,
                account_key,
                created_at,
                rows_read,
                rows_valid,
                rows_invalid,
                inserted,
                deduped,
                source_ref
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &import_id,
                input.account_key,
                &timestamp,
                input.rows_read,
                input.rows_valid,
                input.rows_invalid,
                inserted,
                input.deduped,
                input.source_ref
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    log::info!(
        "{} wrote {inserted} rows for {} from {}",
        import_id,
        input.account_key,
        input.source_ref
    );

    Ok(PersistResult {
        import_id,
        inserted,
    })
}

fn upsert_account(
    transaction: &Transaction<'_>,
    db_path: &Path,
    account_key: &str,
    account_type: AccountType,
    timestamp: &str,
) -> ClientResult<()> {
    transaction
        .execute(
            "INSERT INTO internal_accounts (account_key, account_type, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(account_key) DO UPDATE SET updated_at = excluded.updated_at",
            params![account_key, account_type.as_str(), timestamp],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

fn insert_transaction(
    transaction: &Transaction<'_>,
    db_path: &Path,
    import_id: &str,
    row: &CanonicalTransaction,
) -> ClientResult<()> {
    let txn_id = format!("txn_{}", Ulid::new());
    transaction
        .execute(
            "INSERT INTO internal_transactions (
                txn_id,
                import_id,
                account_key,
                posted_at,
                description,
                amount,
                category,
                original_description,
                status
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &txn_id,
                import_id,
                &row.account_key,
                &row.posted_at,
                &row.description,
                to_storage(row.amount),
                &row.category,
                &row.original_description,
                &row.status
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
