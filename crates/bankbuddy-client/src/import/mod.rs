pub(crate) mod dedupe;
pub(crate) mod input;
pub(crate) mod parse;
pub(crate) mod persist;
pub(crate) mod validate;

use std::path::Path;

use rust_decimal::Decimal;
use rusqlite::{Transaction, TransactionBehavior};

use crate::ClientResult;
use crate::contracts::types::{
    ImportAction, ImportDuplicateRow, ImportDuplicateSummary, ImportDuplicatesPreview,
    ImportFileResult, ImportNextStep, ImportSummary,
};
use crate::setup::SetupContext;
use crate::state::{map_sqlite_error, open_connection};

const DUPLICATE_PREVIEW_LIMIT: usize = 50;

/// A normalized row ready for dedupe and storage.
#[derive(Debug, Clone)]
pub(crate) struct CanonicalTransaction {
    pub account_key: String,
    pub posted_at: String,
    pub description: String,
    pub amount: Decimal,
    pub category: Option<String>,
    pub original_description: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ImportRequest<'a> {
    pub path: &'a Path,
    pub account: Option<&'a str>,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ImportExecution {
    pub dry_run: bool,
    pub message: String,
    pub files: Vec<ImportFileResult>,
    pub summary: ImportSummary,
    pub duplicate_summary: ImportDuplicateSummary,
    pub next_step: ImportNextStep,
    pub other_actions: Vec<ImportAction>,
}

/// Imports every resolved file in one `IMMEDIATE` transaction. Source and
/// header problems fail the whole import before anything is written; a dry
/// run performs the same writes and rolls them back.
pub(crate) fn execute(
    setup: &SetupContext,
    request: ImportRequest<'_>,
) -> ClientResult<ImportExecution> {
    let sources = input::resolve_sources(request.path, request.account)?;

    let mut prepared = Vec::with_capacity(sources.len());
    for source in sources {
        let parsed = parse::parse_csv(&source.source_ref, &source.content)?;
        let validated = validate::validate_rows(&source.source_ref, &source.account_key, parsed);
        prepared.push((source, validated));
    }

    let db_path = setup.db_path.as_path();
    let mut connection = open_connection(db_path)?;
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut files = Vec::with_capacity(prepared.len());
    for (source, validated) in prepared {
        files.push(import_file(
            &transaction,
            db_path,
            source,
            validated,
            request.dry_run,
        )?);
    }

    if request.dry_run {
        transaction
            .rollback()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    } else {
        transaction
            .commit()
            .map_err(|error| map_sqlite_error(db_path, &error))?;
    }

    let mut summary = ImportSummary::default();
    let mut duplicate_summary = ImportDuplicateSummary::default();
    for file in &files {
        summary.absorb(&file.summary);
        duplicate_summary.total += file.duplicate_summary.total;
        duplicate_summary.batch += file.duplicate_summary.batch;
        duplicate_summary.existing_ledger += file.duplicate_summary.existing_ledger;
    }

    let (next_step, other_actions) = build_next_actions(request.dry_run);
    Ok(ImportExecution {
        dry_run: request.dry_run,
        message: build_message(request.dry_run, &summary),
        files,
        summary,
        duplicate_summary,
        next_step,
        other_actions,
    })
}

fn import_file(
    transaction: &Transaction<'_>,
    db_path: &Path,
    source: input::SourceFile,
    validated: validate::ValidatedRows,
    dry_run: bool,
) -> ClientResult<ImportFileResult> {
    let batch = dedupe::dedupe_batch(validated.rows);
    let existing = dedupe::dedupe_against_existing(transaction, batch.insertable_rows, db_path)?;
    let batch_count = batch.duplicate_rows.len() as i64;
    let existing_count = existing.duplicate_rows.len() as i64;
    let duplicate_rows = dedupe::merge_duplicate_rows(batch.duplicate_rows, existing.duplicate_rows);
    let deduped = duplicate_rows.len() as i64;

    let persisted = persist::persist_file(
        transaction,
        db_path,
        persist::PersistInput {
            account_key: &source.account_key,
            account_type: source.account_type,
            rows: &existing.insertable_rows,
            rows_read: validated.summary.rows_read,
            rows_valid: validated.summary.rows_valid,
            rows_invalid: validated.summary.rows_invalid,
            deduped,
            source_ref: &source.source_ref,
        },
    )?;

    Ok(ImportFileResult {
        source_ref: source.source_ref,
        account_key: source.account_key,
        account_type: source.account_type,
        import_id: (!dry_run).then_some(persisted.import_id),
        summary: ImportSummary {
            inserted: persisted.inserted,
            deduped,
            ..validated.summary
        },
        duplicate_summary: ImportDuplicateSummary {
            total: deduped,
            batch: batch_count,
            existing_ledger: existing_count,
        },
        duplicates_preview: build_duplicates_preview(&duplicate_rows),
        issues: validated.issues,
    })
}

fn build_duplicates_preview(rows: &[dedupe::DuplicateRecord]) -> ImportDuplicatesPreview {
    let preview_rows = rows
        .iter()
        .take(DUPLICATE_PREVIEW_LIMIT)
        .map(dedupe::DuplicateRecord::to_contract)
        .collect::<Vec<ImportDuplicateRow>>();

    ImportDuplicatesPreview {
        returned: preview_rows.len() as i64,
        truncated: rows.len() > DUPLICATE_PREVIEW_LIMIT,
        rows: preview_rows,
    }
}

fn build_message(dry_run: bool, summary: &ImportSummary) -> String {
    let base = if dry_run {
        "Dry run complete. No rows were written."
    } else {
        "Import completed successfully."
    };
    if summary.rows_invalid > 0 {
        return format!(
            "{base} {} malformed row(s) were skipped; see issues.",
            summary.rows_invalid
        );
    }
    base.to_string()
}

fn build_next_actions(dry_run: bool) -> (ImportNextStep, Vec<ImportAction>) {
    if dry_run {
        return (
            ImportNextStep {
                label: "Commit this import".to_string(),
                command: "buddy import create <path>".to_string(),
            },
            Vec::new(),
        );
    }

    (
        ImportNextStep {
            label: "Analyze your accounts".to_string(),
            command: "buddy analyze".to_string(),
        },
        vec![
            ImportAction {
                label: "Write the Markdown report".to_string(),
                command: "buddy report".to_string(),
            },
            ImportAction {
                label: "View import list".to_string(),
                command: "buddy import list".to_string(),
            },
            ImportAction {
                label: "List accounts".to_string(),
                command: "buddy account list".to_string(),
            },
        ],
    )
}
