use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};

use crate::contracts::types::DataRange;
use crate::migrations::{
    EXPECTED_USER_VERSION, REQUIRED_INDEX_NAMES, REQUIRED_META_KEYS, REQUIRED_VIEW_NAMES,
    run_pending, safe_repair_statement,
};
use crate::state::{
    ensure_ledger_directory, ledger_db_path, map_sqlite_error, open_connection, resolve_ledger_home,
};
use crate::{ClientError, ClientResult};

/// Tables the migrations must have produced, with the columns the import
/// pipeline and analysis queries rely on.
const LEDGER_TABLES: [(&str, &[&str]); 4] = [
    ("internal_meta", &["key", "value"]),
    (
        "internal_accounts",
        &["account_key", "account_type", "created_at", "updated_at"],
    ),
    (
        "internal_import_runs",
        &[
            "import_id",
            "account_key",
            "source_ref",
            "created_at",
            "rows_read",
            "rows_valid",
            "rows_invalid",
            "inserted",
            "deduped",
        ],
    ),
    (
        "internal_transactions",
        &[
            "txn_id",
            "import_id",
            "account_key",
            "posted_at",
            "description",
            "amount",
            "category",
            "original_description",
            "status",
        ],
    ),
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub home_path: PathBuf,
    pub db_path: PathBuf,
    pub schema_version: String,
    pub data_range: DataRange,
}

/// Views and indexes are derived objects: a missing one is rebuilt from its
/// canonical SQL, a present one must match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Derived {
    View,
    Index,
}

impl Derived {
    fn sqlite_type(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Index => "index",
        }
    }

    fn names(self) -> &'static [&'static str] {
        match self {
            Self::View => &REQUIRED_VIEW_NAMES,
            Self::Index => &REQUIRED_INDEX_NAMES,
        }
    }
}

pub fn ensure_initialized_at(home: &Path) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(Some(home))
}

/// Opens (creating if needed) the ledger under the resolved home, migrates
/// it, restores derived objects and checks that the result is one this
/// build understands.
pub fn ensure_initialized_with_home_override(
    home_override: Option<&Path>,
) -> ClientResult<SetupContext> {
    let home_path = resolve_ledger_home(home_override)?;
    ensure_ledger_directory(&home_path)?;

    let db_path = ledger_db_path(&home_path);
    let mut connection = open_connection(&db_path)?;
    run_pending(&mut connection).map_err(|error| migration_error(&db_path, &error))?;

    let ledger = LedgerCheck {
        connection: &connection,
        db_path: &db_path,
    };
    ledger.require_tables()?;
    ledger.seed_meta()?;
    for kind in [Derived::View, Derived::Index] {
        ledger.restore_missing(kind)?;
    }
    ledger.require_versions()?;
    ledger.require_canonical_views()?;

    let schema_version = ledger.meta_value("schema_version")?.unwrap_or_else(|| "v1".to_string());
    let data_range = ledger.data_range()?;
    log::debug!("ledger ready at {}", db_path.display());

    Ok(SetupContext {
        home_path,
        db_path,
        schema_version,
        data_range,
    })
}

/// Locked, corrupt and permission failures keep their own codes so the CLI
/// can point at the right fix; anything else is a failed migration.
fn migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    if let rusqlite_migration::Error::RusqliteError { err, .. } = error {
        let mapped = map_sqlite_error(db_path, err);
        if matches!(
            mapped.code.as_str(),
            "ledger_locked" | "ledger_corrupt" | "ledger_init_permission_denied"
        ) {
            return mapped;
        }
    }
    ClientError::migration_failed(db_path, &error.to_string())
}

struct LedgerCheck<'a> {
    connection: &'a Connection,
    db_path: &'a Path,
}

impl LedgerCheck<'_> {
    fn sqlite(&self, error: rusqlite::Error) -> ClientError {
        map_sqlite_error(self.db_path, &error)
    }

    fn corrupt(&self) -> ClientError {
        ClientError::ledger_corrupt(self.db_path)
    }

    fn require_tables(&self) -> ClientResult<()> {
        for (table, required) in LEDGER_TABLES {
            if !self.exists("table", table)? {
                return Err(self.corrupt());
            }
            let present = self.columns(table)?;
            if required.iter().any(|column| !present.iter().any(|name| name == column)) {
                log::warn!("table {table} is missing expected columns");
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    /// Insert-only. A drifted value is caught by `require_versions`.
    fn seed_meta(&self) -> ClientResult<()> {
        for (key, value) in REQUIRED_META_KEYS {
            self.connection
                .execute(
                    "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                    params![key, value],
                )
                .map_err(|error| self.sqlite(error))?;
        }
        Ok(())
    }

    fn restore_missing(&self, kind: Derived) -> ClientResult<()> {
        for name in kind.names() {
            if self.exists(kind.sqlite_type(), name)? {
                continue;
            }
            log::info!("restoring missing {} {name}", kind.sqlite_type());
            let sql = canonical_sql(name, self.db_path)?;
            self.connection
                .execute_batch(&sql)
                .map_err(|error| self.sqlite(error))?;
        }
        Ok(())
    }

    fn require_versions(&self) -> ClientResult<()> {
        let user_version = self
            .connection
            .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
            .map_err(|error| self.sqlite(error))?;
        if user_version != EXPECTED_USER_VERSION {
            return Err(self.corrupt());
        }

        for (key, expected) in REQUIRED_META_KEYS {
            if self.meta_value(key)?.as_deref() != Some(expected) {
                log::warn!("ledger meta key {key} does not read {expected}");
                return Err(self.corrupt());
            }
        }

        for kind in [Derived::View, Derived::Index] {
            for name in kind.names() {
                if !self.exists(kind.sqlite_type(), name)? {
                    return Err(self.corrupt());
                }
            }
        }
        Ok(())
    }

    /// A view that exists under the right name but selects something else
    /// would silently change what readers see.
    fn require_canonical_views(&self) -> ClientResult<()> {
        for name in REQUIRED_VIEW_NAMES {
            let stored = self
                .connection
                .query_row(
                    "SELECT sql FROM sqlite_master WHERE type = 'view' AND name = ?1",
                    [name],
                    |row| row.get::<_, String>(0),
                )
                .optional()
                .map_err(|error| self.sqlite(error))?
                .ok_or_else(|| self.corrupt())?;

            let block = canonical_sql(name, self.db_path)?;
            let expected = block
                .split(';')
                .map(str::trim)
                .find(|statement| statement.to_ascii_lowercase().starts_with("create view "))
                .ok_or_else(|| {
                    ClientError::ledger_init_failed(self.db_path, "Canonical view SQL is empty.")
                })?;

            if squash_sql(&stored) != squash_sql(expected) {
                return Err(self.corrupt());
            }
        }
        Ok(())
    }

    fn exists(&self, sqlite_type: &str, name: &str) -> ClientResult<bool> {
        self.connection
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2)",
                params![sqlite_type, name],
                |row| row.get::<_, bool>(0),
            )
            .map_err(|error| self.sqlite(error))
    }

    fn columns(&self, table: &str) -> ClientResult<Vec<String>> {
        // pragma_table_info takes the table name as a bound parameter.
        let mut statement = self
            .connection
            .prepare("SELECT name FROM pragma_table_info(?1)")
            .map_err(|error| self.sqlite(error))?;
        let names = statement
            .query_map([table], |row| row.get::<_, String>(0))
            .map_err(|error| self.sqlite(error))?
            .collect::<Result<Vec<String>, rusqlite::Error>>()
            .map_err(|error| self.sqlite(error))?;
        Ok(names)
    }

    fn meta_value(&self, key: &str) -> ClientResult<Option<String>> {
        self.connection
            .query_row("SELECT value FROM internal_meta WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(|error| self.sqlite(error))
    }

    fn data_range(&self) -> ClientResult<DataRange> {
        self.connection
            .query_row(
                "SELECT MIN(posted_at), MAX(posted_at) FROM internal_transactions",
                [],
                |row| {
                    Ok(DataRange {
                        earliest: row.get(0)?,
                        latest: row.get(1)?,
                    })
                },
            )
            .map_err(|error| self.sqlite(error))
    }
}

fn canonical_sql(name: &str, db_path: &Path) -> ClientResult<String> {
    safe_repair_statement(name).ok_or_else(|| {
        ClientError::ledger_init_failed(db_path, &format!("No canonical SQL for `{name}`."))
    })
}

fn squash_sql(sql: &str) -> String {
    sql.chars()
        .filter(|value| !value.is_whitespace() && *value != ';')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{ensure_initialized_at, squash_sql};

    #[test]
    fn view_comparison_ignores_layout_and_case() {
        assert_eq!(
            squash_sql("CREATE VIEW v1_imports AS\n  SELECT import_id FROM x;"),
            squash_sql("create view v1_imports as select import_id from x")
        );
        assert_ne!(
            squash_sql("create view v1_imports as select import_id from x"),
            squash_sql("create view v1_imports as select account_key from x")
        );
    }

    #[test]
    fn initialization_is_repeatable() {
        let temp = tempfile::tempdir();
        assert!(temp.is_ok());
        if let Ok(dir) = temp {
            assert!(ensure_initialized_at(dir.path()).is_ok());
            let second = ensure_initialized_at(dir.path());
            assert!(second.is_ok());
            if let Ok(context) = second {
                assert_eq!(context.schema_version, "v1");
                assert!(context.data_range.earliest.is_none());
                assert!(context.db_path.ends_with("ledger.db"));
            }
        }
    }
}
