use std::path::{Path, PathBuf};

use crate::ClientResult;
use crate::commands::common::load_setup;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ImportData, ImportListData, ImportListItem};
use crate::import::{self, ImportRequest};
use crate::state::{absolutize, default_export_dir, map_sqlite_error, open_connection};

#[derive(Debug, Default)]
pub struct ImportRunOptions<'a> {
    /// CSV file or directory; defaults to `<home>/bank-exports`.
    pub path: Option<PathBuf>,
    /// Account key override for a single file.
    pub account: Option<String>,
    pub dry_run: bool,
    pub home_override: Option<&'a Path>,
}

#[derive(Debug, Default)]
pub struct ImportListOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn run(path: Option<PathBuf>, dry_run: bool) -> ClientResult<SuccessEnvelope> {
    run_with_options(ImportRunOptions {
        path,
        dry_run,
        ..ImportRunOptions::default()
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ImportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let source = match &options.path {
        Some(path) => absolutize(path)?,
        None => default_export_dir(&setup.home_path),
    };

    log::info!("importing from {}", source.display());
    let execution = import::execute(
        &setup,
        ImportRequest {
            path: &source,
            account: options.account.as_deref(),
            dry_run: options.dry_run,
        },
    )?;

    let data_range = if execution.dry_run {
        setup.data_range
    } else {
        load_setup(options.home_override)?.data_range
    };

    success(
        "import",
        ImportData {
            dry_run: execution.dry_run,
            path: source.display().to_string(),
            message: execution.message,
            files: execution.files,
            summary: execution.summary,
            duplicate_summary: execution.duplicate_summary,
            next_step: execution.next_step,
            other_actions: execution.other_actions,
            data_range,
        },
    )
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(ImportListOptions::default())
}

#[doc(hidden)]
pub fn list_with_options(options: ImportListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = setup.db_path.as_path();
    let connection = open_connection(db_path)?;
    let sqlite = |error: rusqlite::Error| map_sqlite_error(db_path, &error);

    let mut statement = connection
        .prepare(
            "SELECT import_id, account_key, source_ref, created_at,
                    rows_read, rows_valid, rows_invalid, inserted, deduped
             FROM v1_imports
             ORDER BY created_at DESC, import_id DESC",
        )
        .map_err(sqlite)?;
    let rows = statement
        .query_map([], |row| {
            Ok(ImportListItem {
                import_id: row.get("import_id")?,
                account_key: row.get("account_key")?,
                source_ref: row.get("source_ref")?,
                created_at: row.get("created_at")?,
                rows_read: row.get("rows_read")?,
                rows_valid: row.get("rows_valid")?,
                rows_invalid: row.get("rows_invalid")?,
                inserted: row.get("inserted")?,
                deduped: row.get("deduped")?,
            })
        })
        .map_err(sqlite)?
        .collect::<Result<Vec<ImportListItem>, rusqlite::Error>>()
        .map_err(sqlite)?;

    success("import list", ImportListData { rows })
}
