use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::analysis::query::{load_accounts, load_transactions};
use crate::commands::common::{
    SplitArgs, load_setup, resolve_as_of, resolve_parties, resolve_recent_days,
};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::ReportData;
use crate::report::{ReportOptions, chart_file_name, gather, render_markdown};
use crate::state::{absolutize, default_report_path, open_connection};
use crate::{ClientError, ClientResult};

const COMMAND: &str = "report";

#[derive(Debug, Default)]
pub struct ReportRunOptions<'a> {
    /// Defaults to `<home>/reports/Bank_Transaction_Report.md`.
    pub output: Option<PathBuf>,
    /// Where `<account_key>_top_categories.png` images are looked up.
    /// Defaults to the output file's directory.
    pub charts_dir: Option<PathBuf>,
    pub split: SplitArgs,
    /// Fixed footer timestamp; the local clock is used when absent.
    pub generated_at: Option<String>,
    pub home_override: Option<&'a Path>,
}

pub fn run(output: Option<PathBuf>) -> ClientResult<SuccessEnvelope> {
    run_with_options(ReportRunOptions {
        output,
        ..ReportRunOptions::default()
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ReportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let parties = resolve_parties(&options.split, COMMAND)?;
    let recent_days = resolve_recent_days(options.split.days, COMMAND)?;

    let setup = load_setup(options.home_override)?;
    let connection = open_connection(&setup.db_path)?;
    let accounts = load_accounts(&connection, &setup.db_path)?;
    let transactions = load_transactions(&connection, &setup.db_path, None)?;
    if transactions.is_empty() {
        return Err(ClientError::ledger_empty());
    }

    let as_of = resolve_as_of(options.split.as_of.as_deref(), &transactions, COMMAND)?;
    let output_path = match &options.output {
        Some(path) => absolutize(path)?,
        None => default_report_path(&setup.home_path),
    };
    let output_dir = output_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| setup.home_path.clone());
    let charts_dir = match &options.charts_dir {
        Some(path) => absolutize(path)?,
        None => output_dir.clone(),
    };

    let data = gather(&accounts, &transactions, &parties, recent_days, as_of, as_of);
    let charts = discover_charts(
        data.accounts.iter().map(|account| account.account_key.as_str()),
        &charts_dir,
        &output_dir,
    );
    let report_options = ReportOptions {
        parties: parties.clone(),
        recent_days,
        as_of,
        generated_at: options
            .generated_at
            .unwrap_or_else(|| Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
        charts,
    };
    let document = render_markdown(&data, &report_options);

    fs::create_dir_all(&output_dir)
        .map_err(|error| ClientError::report_write_failed(&output_path, &error.to_string()))?;
    fs::write(&output_path, document.as_bytes())
        .map_err(|error| ClientError::report_write_failed(&output_path, &error.to_string()))?;
    log::info!(
        "wrote report for {} account(s) to {}",
        data.accounts.len(),
        output_path.display()
    );

    success(
        COMMAND,
        ReportData {
            output_path: output_path.display().to_string(),
            as_of,
            parameters: parties.parameters(),
            accounts: data
                .accounts
                .iter()
                .map(|account| account.account_key.clone())
                .collect(),
            charts_embedded: report_options.charts.keys().cloned().collect(),
            bytes_written: document.len() as i64,
        },
    )
}

/// Maps account keys to image links for charts that exist on disk. Charts
/// next to the report are linked relatively.
fn discover_charts<'a>(
    account_keys: impl Iterator<Item = &'a str>,
    charts_dir: &Path,
    output_dir: &Path,
) -> BTreeMap<String, String> {
    let mut charts = BTreeMap::new();
    for account_key in account_keys {
        let file_name = chart_file_name(account_key);
        let chart_path = charts_dir.join(&file_name);
        if !chart_path.is_file() {
            log::debug!("no chart for {account_key} at {}", chart_path.display());
            continue;
        }
        let link = if charts_dir == output_dir {
            format!("./{file_name}")
        } else {
            chart_path.display().to_string()
        };
        charts.insert(account_key.to_string(), link);
    }
    charts
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::discover_charts;

    #[test]
    fn only_existing_charts_are_linked() {
        let temp = tempfile::tempdir();
        assert!(temp.is_ok());
        if let Ok(temp) = temp {
            let dir = temp.path();
            assert!(fs::write(dir.join("team_cc_top_categories.png"), b"png").is_ok());

            let charts = discover_charts(["team_cc", "team_checking"].into_iter(), dir, dir);
            assert_eq!(charts.len(), 1);
            assert_eq!(
                charts.get("team_cc").map(String::as_str),
                Some("./team_cc_top_categories.png")
            );

            let elsewhere = dir.join("reports");
            let absolute = discover_charts(["team_cc"].into_iter(), dir, &elsewhere);
            assert_eq!(
                absolute.get("team_cc").cloned(),
                Some(dir.join("team_cc_top_categories.png").display().to_string())
            );
        }
    }
}
