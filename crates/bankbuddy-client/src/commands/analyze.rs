use std::path::Path;

use chrono::Local;

use crate::analysis::query::{load_accounts, load_transactions};
use crate::commands::common::{
    SplitArgs, load_setup, resolve_as_of, resolve_parties, resolve_recent_days,
};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::AnalyzeData;
use crate::report::gather;
use crate::state::open_connection;
use crate::{ClientError, ClientResult};

const COMMAND: &str = "analyze";

#[derive(Debug, Default)]
pub struct AnalyzeOptions<'a> {
    /// Restrict output to one account key.
    pub account: Option<String>,
    pub split: SplitArgs,
    pub home_override: Option<&'a Path>,
}

pub fn run(account: Option<String>) -> ClientResult<SuccessEnvelope> {
    run_with_options(AnalyzeOptions {
        account,
        ..AnalyzeOptions::default()
    })
}

#[doc(hidden)]
pub fn run_with_options(options: AnalyzeOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let parties = resolve_parties(&options.split, COMMAND)?;
    let recent_days = resolve_recent_days(options.split.days, COMMAND)?;

    let setup = load_setup(options.home_override)?;
    let connection = open_connection(&setup.db_path)?;
    let mut accounts = load_accounts(&connection, &setup.db_path)?;
    let transactions = load_transactions(&connection, &setup.db_path, options.account.as_deref())?;

    if let Some(account_key) = options.account.as_deref() {
        accounts.retain(|account| account.account_key == account_key);
        if accounts.is_empty() {
            return Err(ClientError::account_not_found(account_key));
        }
    }
    if transactions.is_empty() {
        return Err(ClientError::ledger_empty());
    }

    let as_of = resolve_as_of(options.split.as_of.as_deref(), &transactions, COMMAND)?;
    let today = Local::now().date_naive();
    let report = gather(&accounts, &transactions, &parties, recent_days, as_of, today);

    success(
        COMMAND,
        AnalyzeData {
            as_of,
            today,
            parameters: parties.parameters(),
            recent_days,
            accounts: report.accounts,
        },
    )
}
