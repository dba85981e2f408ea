use std::fs;
use std::path::{Path, PathBuf};

use crate::contracts::types::AccountType;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub(crate) struct SourceFile {
    pub(crate) source_ref: String,
    pub(crate) account_key: String,
    pub(crate) account_type: AccountType,
    pub(crate) content: String,
}

/// Expands `path` into the CSV files to import. A directory contributes every
/// `*.csv` directly inside it, sorted by file name.
pub(crate) fn resolve_sources(path: &Path, account: Option<&str>) -> ClientResult<Vec<SourceFile>> {
    if !path.exists() {
        return Err(ClientError::import_source_missing(path));
    }

    let files = if path.is_dir() {
        list_csv_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    if files.is_empty() {
        return Err(ClientError::import_source_empty(path));
    }

    let explicit_key = match account {
        Some(raw) => {
            if files.len() > 1 {
                return Err(ClientError::import_account_ambiguous());
            }
            Some(normalize_account_key(raw).ok_or_else(|| {
                ClientError::invalid_argument_for_command(
                    "`--account` must contain at least one letter or digit.",
                    Some("import create"),
                )
            })?)
        }
        None => None,
    };

    let mut sources = Vec::with_capacity(files.len());
    for file in files {
        let account_key = match &explicit_key {
            Some(key) => key.clone(),
            None => account_key_for_file(&file)?,
        };
        let bytes = fs::read(&file)
            .map_err(|error| ClientError::import_source_unreadable(&file, &error.to_string()))?;
        let content = String::from_utf8(bytes).map_err(|_| {
            ClientError::import_source_unreadable(&file, "file is not valid UTF-8 text")
        })?;

        sources.push(SourceFile {
            source_ref: file.display().to_string(),
            account_type: AccountType::infer_from_key(&account_key),
            account_key,
            content,
        });
    }

    Ok(sources)
}

fn list_csv_files(directory: &Path) -> ClientResult<Vec<PathBuf>> {
    let entries = fs::read_dir(directory)
        .map_err(|error| ClientError::import_source_unreadable(directory, &error.to_string()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .map_err(|error| ClientError::import_source_unreadable(directory, &error.to_string()))?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }

    files.sort_by(|left, right| left.file_name().cmp(&right.file_name()));
    Ok(files)
}

fn account_key_for_file(file: &Path) -> ClientResult<String> {
    let stem = file
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or_default();
    derive_account_key(stem).ok_or_else(|| {
        ClientError::invalid_argument_with_recovery(
            &format!(
                "Could not derive an account key from file name `{}`.",
                file.display()
            ),
            vec![
                "Rename the export so its name identifies the account, e.g. Team_CC.csv.".to_string(),
                "Or pass --account <key> with a single CSV file.".to_string(),
            ],
        )
    })
}

/// `Team_Beeb_CC_01-01-2025_03-31-2025` becomes `team_beeb_cc`: the key is
/// normalized and trailing `MM_DD_YYYY` (or `YYYY_MM_DD`) dates from the
/// export range are dropped. Other numbers, such as a card's last four
/// digits, stay part of the key.
pub(crate) fn derive_account_key(file_stem: &str) -> Option<String> {
    let normalized = normalize_account_key(file_stem)?;
    let mut tokens = normalized.split('_').collect::<Vec<&str>>();
    while tokens.len() > 3 && is_date_tokens(&tokens[tokens.len() - 3..]) {
        tokens.truncate(tokens.len() - 3);
    }
    Some(tokens.join("_"))
}

fn is_date_tokens(tokens: &[&str]) -> bool {
    let numeric = |token: &str, widths: &[usize]| {
        widths.contains(&token.len())
            && token.chars().all(|character| character.is_ascii_digit())
    };
    let in_range = |token: &str, low: u32, high: u32| {
        token
            .parse::<u32>()
            .is_ok_and(|value| (low..=high).contains(&value))
    };
    match *tokens {
        [month, day, year] if numeric(month, &[1, 2]) && numeric(day, &[1, 2]) => {
            numeric(year, &[2, 4]) && in_range(month, 1, 12) && in_range(day, 1, 31)
        }
        [year, month, day] if numeric(year, &[4]) => {
            numeric(month, &[2])
                && numeric(day, &[2])
                && in_range(month, 1, 12)
                && in_range(day, 1, 31)
        }
        _ => false,
    }
}

/// Lowercases and turns `-` and whitespace into `_`, collapsing runs.
pub(crate) fn normalize_account_key(raw: &str) -> Option<String> {
    let replaced = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|character| {
            if character == '-' || character.is_whitespace() {
                '_'
            } else {
                character
            }
        })
        .collect::<String>();
    let key = replaced
        .split('_')
        .filter(|token| !token.is_empty())
        .collect::<Vec<&str>>()
        .join("_");
    if key.chars().any(|character| character.is_alphanumeric()) {
        Some(key)
    } else {
        None
    }
}
