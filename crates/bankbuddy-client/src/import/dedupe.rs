use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::ClientResult;
use crate::contracts::types::ImportDuplicateRow;
use crate::import::validate::ValidRow;
use crate::money::to_storage;
use crate::state::map_sqlite_error;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum DedupeReason {
    Batch,
    ExistingLedger,
}

impl DedupeReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Batch => "batch",
            Self::ExistingLedger => "existing_ledger",
        }
    }
}

/// (account, date, description, amount) with the amount in storage form.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub(crate) struct DedupeKey {
    account_key: String,
    posted_at: String,
    description: String,
    amount: String,
}

impl DedupeKey {
    pub(crate) fn of(row: &ValidRow) -> Self {
        let transaction = &row.transaction;
        Self {
            account_key: transaction.account_key.clone(),
            posted_at: transaction.posted_at.clone(),
            description: transaction.description.clone(),
            amount: to_storage(transaction.amount),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DuplicateRecord {
    pub(crate) row: ValidRow,
    pub(crate) dedupe_reason: DedupeReason,
    pub(crate) matched_batch_row_index: Option<i64>,
    pub(crate) matched_txn_id: Option<String>,
    pub(crate) matched_import_id: Option<String>,
}

impl DuplicateRecord {
    pub(crate) fn to_contract(&self) -> ImportDuplicateRow {
        let transaction = &self.row.transaction;
        ImportDuplicateRow {
            source_row_index: self.row.source_row_index,
            dedupe_reason: self.dedupe_reason.as_str().to_string(),
            account_key: transaction.account_key.clone(),
            posted_at: transaction.posted_at.clone(),
            amount: transaction.amount,
            description: transaction.description.clone(),
            matched_batch_row_index: self.matched_batch_row_index,
            matched_txn_id: self.matched_txn_id.clone(),
            matched_import_id: self.matched_import_id.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DedupeResult {
    pub(crate) insertable_rows: Vec<ValidRow>,
    pub(crate) duplicate_rows: Vec<DuplicateRecord>,
}

#[derive(Debug, Clone)]
struct LedgerMatch {
    txn_id: String,
    import_id: String,
}

/// Keeps the first occurrence of each key within one file.
pub(crate) fn dedupe_batch(rows: Vec<ValidRow>) -> DedupeResult {
    let mut seen: HashMap<DedupeKey, i64> = HashMap::new();
    let mut insertable_rows = Vec::new();
    let mut duplicate_rows = Vec::new();

    for row in rows {
        let key = DedupeKey::of(&row);
        if let Some(first_index) = seen.get(&key) {
            log::debug!(
                "row {} repeats row {first_index} within the same file",
                row.source_row_index
            );
            duplicate_rows.push(DuplicateRecord {
                row,
                dedupe_reason: DedupeReason::Batch,
                matched_batch_row_index: Some(*first_index),
                matched_txn_id: None,
                matched_import_id: None,
            });
            continue;
        }

        seen.insert(key, row.source_row_index);
        insertable_rows.push(row);
    }

    DedupeResult {
        insertable_rows,
        duplicate_rows,
    }
}

/// Drops rows whose key is already stored. Runs inside the import transaction
/// so rows written for earlier files of the same import are matched too.
pub(crate) fn dedupe_against_existing(
    connection: &Connection,
    rows: Vec<ValidRow>,
    db_path: &Path,
) -> ClientResult<DedupeResult> {
    let mut insertable_rows = Vec::new();
    let mut duplicate_rows = Vec::new();

    for row in rows {
        if let Some(existing) = find_existing_match(connection, &row, db_path)? {
            log::debug!(
                "row {} already stored as {}",
                row.source_row_index,
                existing.txn_id
            );
            duplicate_rows.push(DuplicateRecord {
                row,
                dedupe_reason: DedupeReason::ExistingLedger,
                matched_batch_row_index: None,
                matched_txn_id: Some(existing.txn_id),
                matched_import_id: Some(existing.import_id),
            });
            continue;
        }
        insertable_rows.push(row);
    }

    Ok(DedupeResult {
        insertable_rows,
        duplicate_rows,
    })
}

fn find_existing_match(
    connection: &Connection,
    row: &ValidRow,
    db_path: &Path,
) -> ClientResult<Option<LedgerMatch>> {
    let transaction = &row.transaction;
    connection
        .query_row(
            "SELECT txn_id, import_id
             FROM internal_transactions
             WHERE account_key = ?1
               AND posted_at = ?2
               AND description = ?3
               AND amount = ?4
             LIMIT 1",
            params![
                &transaction.account_key,
                &transaction.posted_at,
                &transaction.description,
                to_storage(transaction.amount)
            ],
            |result| {
                Ok(LedgerMatch {
                    txn_id: result.get(0)?,
                    import_id: result.get(1)?,
                })
            },
        )
        .optional()
        .map_err(|error| map_sqlite_error(db_path, &error))
}

/// Batch and ledger duplicates in source-row order.
pub(crate) fn merge_duplicate_rows(
    mut batch_rows: Vec<DuplicateRecord>,
    mut existing_rows: Vec<DuplicateRecord>,
) -> Vec<DuplicateRecord> {
    let mut all_rows = Vec::with_capacity(batch_rows.len() + existing_rows.len());
    all_rows.append(&mut batch_rows);
    all_rows.append(&mut existing_rows);
    all_rows.sort_by_key(|record| record.row.source_row_index);
    all_rows
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{DedupeReason, dedupe_batch};
    use crate::import::CanonicalTransaction;
    use crate::import::validate::ValidRow;

    fn row(index: i64, description: &str, cents: i64) -> ValidRow {
        ValidRow {
            source_row_index: index,
            transaction: CanonicalTransaction {
                account_key: "team_cc".to_string(),
                posted_at: "2025-01-05".to_string(),
                description: description.to_string(),
                amount: Decimal::new(cents, 2),
                category: None,
                original_description: None,
                status: None,
            },
        }
    }

    #[test]
    fn exact_repeats_within_a_file_are_dropped() {
        let result = dedupe_batch(vec![
            row(1, "COFFEE", -450),
            row(2, "COFFEE", -450),
            row(3, "COFFEE", -451),
            row(4, "Coffee", -450),
        ]);
        assert_eq!(result.insertable_rows.len(), 3);
        assert_eq!(result.duplicate_rows.len(), 1);
        let duplicate = &result.duplicate_rows[0];
        assert_eq!(duplicate.dedupe_reason, DedupeReason::Batch);
        assert_eq!(duplicate.matched_batch_row_index, Some(1));
        assert_eq!(duplicate.to_contract().source_row_index, 2);
    }

    #[test]
    fn amount_scale_does_not_defeat_the_key() {
        let mut scaled = row(2, "COFFEE", -45);
        scaled.transaction.amount = Decimal::new(-4500, 3);
        let result = dedupe_batch(vec![row(1, "COFFEE", -450), scaled]);
        assert_eq!(result.duplicate_rows.len(), 1);
    }
}
