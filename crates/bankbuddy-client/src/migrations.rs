use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");

const SAFE_REPAIR_START: &str = "-- bankbuddy:safe_repair:start:";
const SAFE_REPAIR_END: &str = "-- bankbuddy:safe_repair:end:";

pub const EXPECTED_USER_VERSION: i64 = 1;

pub const REQUIRED_VIEW_NAMES: [&str; 3] = ["v1_transactions", "v1_accounts", "v1_imports"];

pub const REQUIRED_INDEX_NAMES: [&str; 4] = [
    "idx_internal_transactions_dedupe_key",
    "idx_internal_transactions_account_posted_at",
    "idx_internal_transactions_import_id",
    "idx_internal_import_runs_created_at_desc",
];

pub const REQUIRED_META_KEYS: [(&str, &str); 3] = [
    ("schema_version", "v1"),
    ("public_views_version", "v1"),
    ("import_contract_version", "v1"),
];

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(vec![M::up(BOOTSTRAP_SQL)]);
    migrations.to_latest(conn)
}

/// Canonical SQL for a view or index: the text between its
/// `safe_repair:start:` and `safe_repair:end:` markers in the bootstrap
/// migration.
pub fn safe_repair_statement(name: &str) -> Option<String> {
    let start_marker = format!("{SAFE_REPAIR_START}{name}\n");
    let end_marker = format!("{SAFE_REPAIR_END}{name}");

    let (_, after_start) = BOOTSTRAP_SQL.split_once(&start_marker)?;
    let (block, _) = after_start.split_once(&end_marker)?;
    let block = block.trim();
    (!block.is_empty()).then(|| block.to_string())
}
