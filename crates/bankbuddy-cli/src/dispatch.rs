use bankbuddy_client::commands::{self, SplitArgs};
use bankbuddy_client::commands::analyze::AnalyzeOptions;
use bankbuddy_client::commands::import::{ImportListOptions, ImportRunOptions};
use bankbuddy_client::commands::report::ReportRunOptions;
use bankbuddy_client::{ClientResult, SuccessEnvelope};

use crate::cli::{AccountCommand, Cli, Commands, ImportCommand, SplitFlags};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    let home_override = cli.home.as_deref();
    match &cli.command {
        Commands::Account { command } => match command {
            AccountCommand::List { .. } => commands::accounts::run_with_home_override(home_override),
        },
        Commands::Import { command } => match command {
            ImportCommand::Create {
                dry_run,
                account,
                path,
                json: _,
            } => commands::import::run_with_options(ImportRunOptions {
                path: path.clone(),
                account: account.clone(),
                dry_run: *dry_run,
                home_override,
            }),
            ImportCommand::List { .. } => {
                commands::import::list_with_options(ImportListOptions { home_override })
            }
        },
        Commands::Analyze { account, split, .. } => {
            commands::analyze::run_with_options(AnalyzeOptions {
                account: account.clone(),
                split: split_args(split),
                home_override,
            })
        }
        Commands::Report {
            output,
            charts_dir,
            split,
            ..
        } => commands::report::run_with_options(ReportRunOptions {
            output: output.clone(),
            charts_dir: charts_dir.clone(),
            split: split_args(split),
            generated_at: None,
            home_override,
        }),
    }
}

fn split_args(flags: &SplitFlags) -> SplitArgs {
    SplitArgs {
        person1_name: flags.person1_name.clone(),
        person2_name: flags.person2_name.clone(),
        person1_percentage: flags.person1_percentage.clone(),
        days: flags.days,
        as_of: flags.as_of.as_ref().map(|value| value.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::cli::parse_from;

    use super::dispatch;

    const SAMPLE_CSV: &str = "Date,Description,Amount,Category\n\
01/05/2025,GROCERY MART,-54.20,Groceries\n\
01/09/2025,CITY POWER,-80.00,Utilities\n\
01/20/2025,PAYMENT THANK YOU,67.10,Payment\n";

    #[test]
    fn dispatches_to_expected_command_names() {
        let temp = tempfile::tempdir();
        assert!(temp.is_ok());
        let Ok(temp) = temp else {
            return;
        };
        let home = temp.path().join("home");
        let home_arg = home.display().to_string();
        let csv_path = temp.path().join("Joint_CC_2025.csv");
        assert!(fs::write(&csv_path, SAMPLE_CSV).is_ok());
        let csv_arg = csv_path.display().to_string();
        let report_arg = temp.path().join("out").join("report.md").display().to_string();

        let cases: [(Vec<&str>, &str); 5] = [
            (
                vec!["buddy", "--home", &home_arg, "import", "create", &csv_arg],
                "import",
            ),
            (vec!["buddy", "--home", &home_arg, "import", "list"], "import list"),
            (vec!["buddy", "--home", &home_arg, "account", "list"], "account list"),
            (vec!["buddy", "--home", &home_arg, "analyze"], "analyze"),
            (
                vec!["buddy", "--home", &home_arg, "report", "--output", &report_arg],
                "report",
            ),
        ];

        for (args, expected_command) in cases {
            let parsed = parse_from(args.clone());
            assert!(parsed.is_ok(), "failed to parse: {args:?}");
            if let Ok(cli) = parsed {
                let response = dispatch(&cli);
                assert!(response.is_ok(), "dispatch failed: {args:?}");
                if let Ok(success) = response {
                    assert_eq!(success.command, expected_command);
                }
            }
        }
    }

    #[test]
    fn split_flags_reach_the_client() {
        let temp = tempfile::tempdir();
        assert!(temp.is_ok());
        let Ok(temp) = temp else {
            return;
        };
        let home_arg = temp.path().join("home").display().to_string();
        let csv_path = temp.path().join("Joint_CC_2025.csv");
        assert!(fs::write(&csv_path, SAMPLE_CSV).is_ok());
        let csv_arg = csv_path.display().to_string();

        let imported = parse_from(["buddy", "--home", &home_arg, "import", "create", &csv_arg]);
        assert!(imported.is_ok());
        if let Ok(cli) = imported {
            assert!(dispatch(&cli).is_ok());
        }

        let parsed = parse_from([
            "buddy",
            "--home",
            &home_arg,
            "analyze",
            "--person1-name",
            "Alex",
            "--person1-percentage",
            "60",
        ]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_ok());
            if let Ok(success) = response {
                assert_eq!(success.data["parameters"]["person1_name"], "Alex");
                assert_eq!(success.data["parameters"]["person1_percentage"], "60");
                assert_eq!(success.data["parameters"]["person2_percentage"], "40");
            }
        }
    }

    #[test]
    fn analyze_on_empty_ledger_fails() {
        let temp = tempfile::tempdir();
        assert!(temp.is_ok());
        let Ok(temp) = temp else {
            return;
        };
        let home_arg = temp.path().display().to_string();
        let parsed = parse_from(["buddy", "--home", &home_arg, "analyze"]);
        assert!(parsed.is_ok());
        if let Ok(cli) = parsed {
            let response = dispatch(&cli);
            assert!(response.is_err());
            if let Err(error) = response {
                assert_eq!(error.code, "ledger_empty");
            }
        }
    }
}
