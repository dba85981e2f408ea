use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

pub(crate) const IMPORT_HELP_COMMAND: &str = "buddy import create --help";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `buddy {cmd} --help` for usage."),
            None => "Run `buddy --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn import_source_missing(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "import_source_missing",
            &format!("Import source `{location}` does not exist."),
            vec![
                "Pass a CSV file or a directory of CSV exports.".to_string(),
                format!("Run `{IMPORT_HELP_COMMAND}` for the expected layout."),
            ],
        )
        .with_data(json!({
            "path": location,
        }))
    }

    pub fn import_source_empty(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "import_source_empty",
            &format!("No CSV exports were found at `{location}`."),
            vec![
                "Download CSV exports from your bank into that directory.".to_string(),
                "Or pass a specific CSV file path.".to_string(),
            ],
        )
        .with_data(json!({
            "path": location,
        }))
    }

    pub fn import_source_unreadable(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::invalid_argument_with_recovery(
            &format!("Could not read import file `{location}`: {detail}"),
            vec![
                "Verify the path exists and is readable.".to_string(),
                "Rerun buddy import create <path>.".to_string(),
            ],
        )
    }

    pub fn import_schema_mismatch(
        source_ref: &str,
        missing_fields: Vec<String>,
        actual_headers: Vec<String>,
    ) -> Self {
        Self::new(
            "import_schema_mismatch",
            &format!(
                "CSV headers in `{source_ref}` are missing: {}.",
                missing_fields.join(", ")
            ),
            vec![
                "Export a CSV that includes date, description and amount columns.".to_string(),
                format!("Run `{IMPORT_HELP_COMMAND}` to review accepted header names."),
            ],
        )
        .with_data(json!({
            "source_ref": source_ref,
            "missing_fields": missing_fields,
            "actual_headers": actual_headers,
        }))
    }

    pub fn import_account_ambiguous() -> Self {
        Self::invalid_argument_with_recovery(
            "`--account` can only be used when importing a single CSV file.",
            vec![
                "Pass one CSV file together with --account.".to_string(),
                "Or drop --account and let file names name the accounts.".to_string(),
            ],
        )
    }

    pub fn invalid_split_percentage(value: &str) -> Self {
        Self::new(
            "invalid_split_percentage",
            &format!("Split percentage must be a number between 0 and 100; got `{value}`."),
            vec!["Pass --person1-percentage with a value such as 50 or 62.5.".to_string()],
        )
        .with_data(json!({
            "received": value,
        }))
    }

    pub fn account_not_found(account_key: &str) -> Self {
        Self::new(
            "account_not_found",
            &format!("Account `{account_key}` has no imported transactions."),
            vec![
                "Run buddy account list to see imported accounts.".to_string(),
                "Retry with one of the listed account keys.".to_string(),
            ],
        )
        .with_data(json!({
            "account_key": account_key,
        }))
    }

    pub fn ledger_empty() -> Self {
        Self::new(
            "ledger_empty",
            "The ledger has no transactions yet.",
            vec![
                format!("Run `{IMPORT_HELP_COMMAND}` to see how to import exports."),
                "Then run buddy import create <path>.".to_string(),
            ],
        )
    }

    pub fn report_write_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "report_write_failed",
            &format!("Could not write report to `{location}`: {detail}"),
            vec![format!(
                "Choose a writable --output path or fix permissions on `{location}`."
            )],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_permission_denied",
            &format!("Cannot initialize ledger at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `BANKBUDDY_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_locked",
            &format!("Ledger database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_corrupt",
            &format!("Ledger database appears corrupt at `{location}`."),
            vec![format!(
                "Move `{location}` aside and re-import your CSV exports."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Ledger migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_failed",
            &format!("Ledger initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }

    /// True for failures caused by the local store or serialization rather
    /// than by user input.
    pub fn is_internal(&self) -> bool {
        self.code.starts_with("internal_")
            || matches!(
                self.code.as_str(),
                "ledger_init_permission_denied"
                    | "ledger_locked"
                    | "ledger_corrupt"
                    | "migration_failed"
                    | "ledger_init_failed"
                    | "report_write_failed"
            )
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
