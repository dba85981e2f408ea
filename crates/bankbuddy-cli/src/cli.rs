use std::path::PathBuf;

use bankbuddy_client::report::MAX_RECENT_DAYS;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return Err("date must use YYYY-MM-DD format".to_string());
        }
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

pub fn parse_recent_days(value: &str) -> Result<i64, String> {
    match value.parse::<i64>() {
        Ok(days) if (1..=MAX_RECENT_DAYS).contains(&days) => Ok(days),
        _ => Err(format!(
            "days must be a whole number between 1 and {MAX_RECENT_DAYS}"
        )),
    }
}

/// Extended help shown after `buddy import create --help`.
pub const IMPORT_CREATE_AFTER_HELP: &str = "\
How import works:
  Point buddy at a CSV export from your bank, or at a directory of them.
  With no path, every *.csv in <home>/bank-exports is imported.
  Each file is one account. The account key comes from the file name:
    Team_Beeb_CC_01-01-2025_03-31-2025.csv  ->  team_beeb_cc
  Use --account <key> to name the account yourself (single file only).
  Keys containing `cc` or `credit` are credit cards; `checking` and
  `savings` are recognized too.

Accepted headers (case-insensitive):
  date:         Date, Transaction Date, Posted Date, Posting Date, Trans. Date
  description:  Description, Payee, Merchant, Name
  amount:       Amount, Transaction Amount, or a Debit + Credit pair
  optional:     Category, Original Description, Memo, Status
  Other columns are ignored.

Values:
  Dates may be YYYY-MM-DD, MM/DD/YYYY, M/D/YYYY or MM/DD/YY.
  Amounts may use $, thousands commas, +/- and (12.34) for negatives,
  with at most 2 decimal places. Negative means money out.

Duplicates:
  A row whose date, description, amount and account all match a stored
  row (or an earlier row of the same file) is skipped. Re-importing the
  same export adds nothing.
  Malformed rows are skipped and listed; the rest of the file imports.

What to do next:
  1. Run `buddy import create --dry-run <path>` and review the summary.
  2. Run `buddy import create <path>` to write the rows.
  3. Run `buddy analyze` or `buddy report`.
";

#[derive(Debug, Parser)]
#[command(
    name = "buddy",
    version,
    about = "household bank ledger, expense splitter and report writer",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Ledger home directory (defaults to $BANKBUDDY_HOME, then ~/.bankbuddy)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List imported accounts
    #[command(arg_required_else_help = true)]
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Import bank CSV exports into the local ledger
    #[command(arg_required_else_help = true)]
    Import {
        #[command(subcommand)]
        command: ImportCommand,
    },
    /// Summarize accounts and split shared expenses
    Analyze {
        /// Only analyze this account key
        #[arg(long)]
        account: Option<String>,
        #[command(flatten)]
        split: SplitFlags,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Write the Markdown transaction report
    Report {
        /// Report file path (defaults to <home>/reports/Bank_Transaction_Report.md)
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
        /// Directory holding <account_key>_top_categories.png charts
        #[arg(long, value_name = "DIR")]
        charts_dir: Option<PathBuf>,
        #[command(flatten)]
        split: SplitFlags,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Default, Args)]
pub struct SplitFlags {
    /// Name of the first person sharing expenses
    #[arg(long, value_name = "NAME")]
    pub person1_name: Option<String>,
    /// Name of the second person sharing expenses
    #[arg(long, value_name = "NAME")]
    pub person2_name: Option<String>,
    /// Person 1's share in percent, 0 to 100 (default 50)
    #[arg(long, value_name = "PERCENT")]
    pub person1_percentage: Option<String>,
    /// Recent-activity window in days (default 30)
    #[arg(long, value_parser = parse_recent_days)]
    pub days: Option<i64>,
    /// Reference date (YYYY-MM-DD); defaults to the latest imported date
    #[arg(long, value_parser = parse_iso_date)]
    pub as_of: Option<IsoDate>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum AccountCommand {
    /// Show transaction counts, date ranges and net amounts per account
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ImportCommand {
    /// Import a CSV export or a directory of exports
    #[command(after_long_help = IMPORT_CREATE_AFTER_HELP)]
    Create {
        /// Parse, validate and dedupe without writing to the ledger
        #[arg(long)]
        dry_run: bool,
        /// Account key for a single-file import
        #[arg(long)]
        account: Option<String>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
        /// CSV file or directory (defaults to <home>/bank-exports)
        path: Option<PathBuf>,
    },
    /// List past imports, newest first
    List {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
