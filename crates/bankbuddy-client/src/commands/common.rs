use std::path::Path;

use chrono::NaiveDate;

use crate::analysis::date::parse_iso_date_strict;
use crate::analysis::types::LedgerTransaction;
use crate::report::{DEFAULT_RECENT_DAYS, MAX_RECENT_DAYS, latest_posted_at};
use crate::setup::{SetupContext, ensure_initialized_with_home_override};
use crate::split::{DEFAULT_PERSON1_NAME, DEFAULT_PERSON2_NAME, SplitParties, SplitRatio};
use crate::{ClientError, ClientResult};

/// Splitting and window arguments shared by `analyze` and `report`.
#[derive(Debug, Clone, Default)]
pub struct SplitArgs {
    pub person1_name: Option<String>,
    pub person2_name: Option<String>,
    /// Person 1's share, e.g. `60` or `62.5%`.
    pub person1_percentage: Option<String>,
    pub days: Option<i64>,
    /// `YYYY-MM-DD`; defaults to the latest stored transaction date.
    pub as_of: Option<String>,
}

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    ensure_initialized_with_home_override(home_override)
}

pub(crate) fn resolve_parties(args: &SplitArgs, command: &str) -> ClientResult<SplitParties> {
    let person1_name = resolve_name(
        args.person1_name.as_deref(),
        DEFAULT_PERSON1_NAME,
        "--person1-name",
        command,
    )?;
    let person2_name = resolve_name(
        args.person2_name.as_deref(),
        DEFAULT_PERSON2_NAME,
        "--person2-name",
        command,
    )?;
    let ratio = match args.person1_percentage.as_deref() {
        Some(raw) => SplitRatio::parse(raw)?,
        None => SplitRatio::even(),
    };

    Ok(SplitParties {
        person1_name,
        person2_name,
        ratio,
    })
}

pub(crate) fn resolve_recent_days(days: Option<i64>, command: &str) -> ClientResult<i64> {
    let value = days.unwrap_or(DEFAULT_RECENT_DAYS);
    if !(1..=MAX_RECENT_DAYS).contains(&value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`--days` must be between 1 and {MAX_RECENT_DAYS}; got {value}."),
            Some(command),
        ));
    }
    Ok(value)
}

/// The supplied date, else the latest stored date. Never the wall clock, so
/// output stays a function of the stored rows.
pub(crate) fn resolve_as_of(
    as_of: Option<&str>,
    transactions: &[LedgerTransaction],
    command: &str,
) -> ClientResult<NaiveDate> {
    if let Some(raw) = as_of {
        return parse_iso_date_strict(raw.trim(), "--as-of", command);
    }
    latest_posted_at(transactions).ok_or_else(ClientError::ledger_empty)
}

fn resolve_name(
    value: Option<&str>,
    default: &str,
    flag: &str,
    command: &str,
) -> ClientResult<String> {
    let Some(raw) = value else {
        return Ok(default.to_string());
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{flag}` must not be empty."),
            Some(command),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{SplitArgs, resolve_as_of, resolve_parties, resolve_recent_days};
    use crate::analysis::types::LedgerTransaction;

    #[test]
    fn parties_default_to_an_even_split() {
        let parties = resolve_parties(&SplitArgs::default(), "analyze");
        assert!(parties.is_ok());
        if let Ok(parties) = parties {
            assert_eq!(parties.person1_name, "Person 1");
            assert_eq!(parties.person2_name, "Person 2");
            assert_eq!(parties.ratio.person1_percentage(), Decimal::from(50));
        }
    }

    #[test]
    fn blank_names_and_bad_windows_are_rejected() {
        let args = SplitArgs {
            person2_name: Some("  ".to_string()),
            ..SplitArgs::default()
        };
        assert!(resolve_parties(&args, "report").is_err());
        assert!(resolve_recent_days(Some(0), "report").is_err());
        assert!(matches!(resolve_recent_days(None, "report"), Ok(30)));
    }

    #[test]
    fn oversized_windows_are_rejected() {
        assert!(matches!(resolve_recent_days(Some(36_500), "analyze"), Ok(36_500)));
        let result = resolve_recent_days(Some(1_000_000_000), "analyze");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
            assert!(error.message.contains("1000000000"));
        }
    }

    #[test]
    fn as_of_defaults_to_latest_stored_date() {
        let rows = vec![LedgerTransaction {
            txn_id: "txn_1".to_string(),
            account_key: "team_cc".to_string(),
            posted_at: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap_or(NaiveDate::MIN),
            description: "X".to_string(),
            amount: Decimal::ONE,
            category: None,
        }];
        assert_eq!(
            resolve_as_of(None, &rows, "report").ok(),
            NaiveDate::from_ymd_opt(2025, 3, 31)
        );
        assert!(resolve_as_of(Some("2025-02-30"), &rows, "report").is_err());

        let empty = resolve_as_of(None, &[], "report");
        assert!(matches!(empty, Err(ref error) if error.code == "ledger_empty"));
    }
}
