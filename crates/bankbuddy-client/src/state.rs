//! Where the ledger lives on disk and how SQLite failures surface.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, Error as SqliteError, ffi::ErrorCode};

use crate::{ClientError, ClientResult};

pub const HOME_ENV_VAR: &str = "BANKBUDDY_HOME";
const HOME_DIR_NAME: &str = ".bankbuddy";
const REPORT_FILE_NAME: &str = "Bank_Transaction_Report.md";
const BUSY_TIMEOUT: Duration = Duration::from_millis(250);

/// `--home` beats `BANKBUDDY_HOME`, which beats `~/.bankbuddy`.
pub fn resolve_ledger_home(home_override: Option<&Path>) -> ClientResult<PathBuf> {
    let candidate = home_override
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(HOME_ENV_VAR).map(PathBuf::from))
        .or_else(|| home::home_dir().map(|home| home.join(HOME_DIR_NAME)))
        .ok_or_else(|| {
            ClientError::ledger_init_failed(
                Path::new("."),
                "Could not resolve a home directory for the ledger.",
            )
        })?;
    absolutize(&candidate)
}

pub fn ensure_ledger_directory(home: &Path) -> ClientResult<()> {
    fs::create_dir_all(home).map_err(|error| map_io_error(home, &error))?;
    restrict_to_owner(home);
    Ok(())
}

pub fn ledger_db_path(home: &Path) -> PathBuf {
    home.join("ledger.db")
}

pub fn default_export_dir(home: &Path) -> PathBuf {
    home.join("bank-exports")
}

pub fn default_report_path(home: &Path) -> PathBuf {
    home.join("reports").join(REPORT_FILE_NAME)
}

pub fn open_connection(db_path: &Path) -> ClientResult<Connection> {
    let connection = Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .busy_timeout(BUSY_TIMEOUT)
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

fn map_io_error(path: &Path, error: &io::Error) -> ClientError {
    match error.kind() {
        io::ErrorKind::PermissionDenied => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

/// Busy and locked databases, files that are not SQLite, and permission
/// problems each get their own code; everything else is an init failure.
pub fn map_sqlite_error(path: &Path, error: &SqliteError) -> ClientError {
    match error.sqlite_error_code() {
        Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => ClientError::ledger_locked(path),
        Some(ErrorCode::NotADatabase) => ClientError::ledger_corrupt(path),
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly) => {
            ClientError::ledger_init_permission_denied(path, &error.to_string())
        }
        _ => ClientError::ledger_init_failed(path, &error.to_string()),
    }
}

pub(crate) fn absolutize(path: &Path) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|error| ClientError::ledger_init_failed(path, &error.to_string()))
}

#[cfg(unix)]
fn restrict_to_owner(home: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(error) = fs::set_permissions(home, fs::Permissions::from_mode(0o700)) {
        log::debug!("could not restrict {}: {error}", home.display());
    }
}

#[cfg(not(unix))]
fn restrict_to_owner(_home: &Path) {}
