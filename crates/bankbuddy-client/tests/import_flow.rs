use std::fs;
use std::path::{Path, PathBuf};

use bankbuddy_client::commands::import::{self, ImportListOptions, ImportRunOptions};
use bankbuddy_client::{ClientResult, SuccessEnvelope};
use rusqlite::Connection;
use serde_json::Value;
use tempfile::tempdir;

const CHECKING_CSV: &str = "\
Date,Description,Amount,Category
2025-01-02,PAYROLL ACME,2500.00,Income
2025-01-03,RENT JANUARY,-1800.00,Housing
2025-01-07,GROCERY MART,-64.18,Groceries
";

fn write_file(path: &Path, body: &str) {
    let result = fs::write(path, body);
    assert!(result.is_ok());
}

fn temp_home() -> std::io::Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempdir()?;
    let home = dir.path().join("ledger-home");
    Ok((dir, home))
}

fn run_import(home: &Path, path: &Path, dry_run: bool) -> ClientResult<SuccessEnvelope> {
    import::run_with_options(ImportRunOptions {
        path: Some(path.to_path_buf()),
        account: None,
        dry_run,
        home_override: Some(home),
    })
}

fn transaction_count(home: &Path) -> i64 {
    let connection = Connection::open(home.join("ledger.db"));
    assert!(connection.is_ok());
    connection
        .ok()
        .and_then(|connection| {
            connection
                .query_row("SELECT COUNT(*) FROM v1_transactions", [], |row| {
                    row.get::<_, i64>(0)
                })
                .ok()
        })
        .unwrap_or(-1)
}

fn summary_field(success: &SuccessEnvelope, field: &str) -> i64 {
    success.data["summary"][field].as_i64().unwrap_or(-1)
}

#[test]
fn reimporting_same_file_is_idempotent() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let csv = dir.path().join("Household_Checking.csv");
        write_file(&csv, CHECKING_CSV);

        let first = run_import(&home, &csv, false);
        assert!(first.is_ok());
        if let Ok(success) = &first {
            assert_eq!(success.command, "import");
            assert_eq!(summary_field(success, "inserted"), 3);
            assert_eq!(success.data["files"][0]["account_key"], "household_checking");
            assert_eq!(success.data["files"][0]["account_type"], "checking");
            assert_eq!(success.data["data_range"]["earliest"], "2025-01-02");
        }
        let after_first = transaction_count(&home);

        let second = run_import(&home, &csv, false);
        assert!(second.is_ok());
        if let Ok(success) = &second {
            assert_eq!(summary_field(success, "inserted"), 0);
            assert_eq!(summary_field(success, "deduped"), 3);
            assert_eq!(success.data["duplicate_summary"]["existing_ledger"], 3);
        }
        assert_eq!(transaction_count(&home), after_first);
    }
}

#[test]
fn three_rows_with_one_stored_duplicate_insert_two() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let earlier = dir.path().join("Joint_CC_December.csv");
        write_file(
            &earlier,
            "Date,Description,Amount\n12/28/2024,COFFEE HOUSE,-4.50\n",
        );
        assert!(run_import(&home, &earlier, false).is_ok());

        let later = dir.path().join("Joint_CC_January.csv");
        write_file(
            &later,
            "Date,Description,Amount\n\
12/28/2024,COFFEE HOUSE,-4.50\n\
01/02/2025,BOOK SHOP,-22.00\n\
01/04/2025,GAS STATION,-40.00\n",
        );
        let result = import::run_with_options(ImportRunOptions {
            path: Some(later.clone()),
            account: Some("joint_cc_december".to_string()),
            dry_run: false,
            home_override: Some(&home),
        });
        assert!(result.is_ok());
        if let Ok(success) = result {
            assert_eq!(summary_field(&success, "inserted"), 2);
            assert_eq!(summary_field(&success, "deduped"), 1);
            let duplicate = &success.data["files"][0]["duplicates_preview"]["rows"][0];
            assert_eq!(duplicate["dedupe_reason"], "existing_ledger");
            assert_eq!(duplicate["source_row_index"], 1);
            assert!(duplicate["matched_txn_id"].is_string());
        }
        assert_eq!(transaction_count(&home), 3);
    }
}

#[test]
fn dry_run_reports_counts_without_writing() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let csv = dir.path().join("Household_Checking.csv");
        write_file(&csv, CHECKING_CSV);

        let result = run_import(&home, &csv, true);
        assert!(result.is_ok());
        if let Ok(success) = result {
            assert_eq!(success.data["dry_run"], Value::Bool(true));
            assert_eq!(summary_field(&success, "inserted"), 3);
            assert!(success.data["files"][0].get("import_id").is_none());
            let command = success.data["next_step"]["command"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            assert!(command.starts_with("buddy import create"));
        }
        assert_eq!(transaction_count(&home), 0);

        let list = import::list_with_options(ImportListOptions {
            home_override: Some(&home),
        });
        assert!(list.is_ok());
        if let Ok(success) = list {
            assert_eq!(success.data["rows"].as_array().map(Vec::len), Some(0));
        }
    }
}

#[test]
fn missing_amount_header_is_a_schema_mismatch() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let csv = dir.path().join("Joint_CC.csv");
        write_file(&csv, "Date,Description,Note\n01/02/2025,BOOK SHOP,gift\n");

        let result = run_import(&home, &csv, false);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "import_schema_mismatch");
            assert!(!error.is_internal());
            let missing = error
                .data
                .as_ref()
                .and_then(|data| data.get("missing_fields"))
                .cloned()
                .unwrap_or(Value::Null);
            assert_eq!(missing, serde_json::json!(["amount"]));
        }
        assert_eq!(transaction_count(&home), 0);
    }
}

#[test]
fn schema_error_in_one_file_aborts_the_whole_directory() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let exports = dir.path().join("exports");
        assert!(fs::create_dir_all(&exports).is_ok());
        write_file(&exports.join("A_Checking.csv"), CHECKING_CSV);
        write_file(&exports.join("B_Savings.csv"), "When,What\n2025-01-01,x\n");

        let result = run_import(&home, &exports, false);
        assert!(result.is_err());
        assert_eq!(transaction_count(&home), 0);
    }
}

#[test]
fn directory_import_covers_each_csv_in_name_order() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let exports = dir.path().join("exports");
        assert!(fs::create_dir_all(&exports).is_ok());
        write_file(&exports.join("Team_Checking_01-01-2025_01-31-2025.csv"), CHECKING_CSV);
        write_file(
            &exports.join("Team_CC_01-01-2025_01-31-2025.CSV"),
            "Posted Date,Payee,Debit,Credit\n01/05/2025,GROCERY MART,54.20,\n01/20/2025,PAYMENT THANK YOU,,54.20\n",
        );
        write_file(&exports.join("notes.txt"), "not an export");

        let result = run_import(&home, &exports, false);
        assert!(result.is_ok());
        if let Ok(success) = result {
            let files = success.data["files"].as_array().cloned().unwrap_or_default();
            assert_eq!(files.len(), 2);
            assert_eq!(files[0]["account_key"], "team_cc");
            assert_eq!(files[0]["account_type"], "credit_card");
            assert_eq!(files[1]["account_key"], "team_checking");
            assert_eq!(summary_field(&success, "inserted"), 5);
        }

        let connection = Connection::open(home.join("ledger.db"));
        assert!(connection.is_ok());
        if let Ok(connection) = connection {
            let amounts = connection
                .prepare(
                    "SELECT amount FROM v1_transactions
                     WHERE account_key = 'team_cc' ORDER BY posted_at",
                )
                .and_then(|mut statement| {
                    statement
                        .query_map([], |row| row.get::<_, String>(0))?
                        .collect::<Result<Vec<String>, _>>()
                });
            assert!(amounts.is_ok());
            if let Ok(amounts) = amounts {
                assert_eq!(amounts, vec!["-54.20".to_string(), "54.20".to_string()]);
            }
        }
    }
}

#[test]
fn cards_differing_only_by_last_four_stay_separate_accounts() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let exports = dir.path().join("exports");
        assert!(fs::create_dir_all(&exports).is_ok());
        let body = "Date,Description,Amount\n2025-01-05,NETFLIX,-15.49\n";
        write_file(&exports.join("Chase_Card_4421.csv"), body);
        write_file(&exports.join("Chase_Card_9935.csv"), body);

        let result = run_import(&home, &exports, false);
        assert!(result.is_ok());
        if let Ok(success) = result {
            assert_eq!(success.data["files"][0]["account_key"], "chase_card_4421");
            assert_eq!(success.data["files"][1]["account_key"], "chase_card_9935");
            assert_eq!(summary_field(&success, "inserted"), 2);
            assert_eq!(summary_field(&success, "deduped"), 0);
        }
        assert_eq!(transaction_count(&home), 2);
    }
}

#[test]
fn account_override_requires_a_single_file() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let exports = dir.path().join("exports");
        assert!(fs::create_dir_all(&exports).is_ok());
        write_file(&exports.join("One_Checking.csv"), CHECKING_CSV);
        write_file(&exports.join("Two_Checking.csv"), CHECKING_CSV);

        let result = import::run_with_options(ImportRunOptions {
            path: Some(exports),
            account: Some("joint".to_string()),
            dry_run: false,
            home_override: Some(&home),
        });
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
        }
    }
}

#[test]
fn malformed_rows_are_skipped_and_reported() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let csv = dir.path().join("Joint_CC.csv");
        write_file(
            &csv,
            "Date,Description,Amount\n\
01/02/2025,BOOK SHOP,-22.00\n\
13/45/2025,BAD DATE,-1.00\n\
01/03/2025,BAD AMOUNT,abc\n\
01/04/2025,,-3.00\n\
01/05/2025,  GAS   STATION ,-40.00\n",
        );

        let result = run_import(&home, &csv, false);
        assert!(result.is_ok());
        if let Ok(success) = result {
            assert_eq!(summary_field(&success, "rows_read"), 5);
            assert_eq!(summary_field(&success, "rows_invalid"), 3);
            assert_eq!(summary_field(&success, "inserted"), 2);
            let codes = success.data["files"][0]["issues"]
                .as_array()
                .cloned()
                .unwrap_or_default()
                .iter()
                .map(|issue| issue["code"].as_str().unwrap_or_default().to_string())
                .collect::<Vec<String>>();
            assert_eq!(
                codes,
                vec![
                    "invalid_date".to_string(),
                    "invalid_number".to_string(),
                    "missing_required_field".to_string(),
                ]
            );
        }

        let connection = Connection::open(home.join("ledger.db"));
        assert!(connection.is_ok());
        if let Ok(connection) = connection {
            let description = connection.query_row(
                "SELECT description FROM v1_transactions WHERE posted_at = '2025-01-05'",
                [],
                |row| row.get::<_, String>(0),
            );
            assert_eq!(description.ok().as_deref(), Some("GAS STATION"));
        }
    }
}

#[test]
fn missing_source_is_a_user_error() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let result = run_import(&home, &dir.path().join("nope.csv"), false);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "import_source_missing");
            assert!(!error.is_internal());
        }
    }
}

#[test]
fn import_list_returns_newest_first() {
    let temp = temp_home();
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let first = dir.path().join("First_Checking.csv");
        let second = dir.path().join("Second_Checking.csv");
        write_file(&first, CHECKING_CSV);
        write_file(&second, CHECKING_CSV);
        assert!(run_import(&home, &first, false).is_ok());
        assert!(run_import(&home, &second, false).is_ok());

        let list = import::list_with_options(ImportListOptions {
            home_override: Some(&home),
        });
        assert!(list.is_ok());
        if let Ok(success) = list {
            assert_eq!(success.command, "import list");
            let rows = success.data["rows"].as_array().cloned().unwrap_or_default();
            assert_eq!(rows.len(), 2);
            assert!(
                rows[0]["created_at"].as_str().unwrap_or_default()
                    >= rows[1]["created_at"].as_str().unwrap_or_default()
            );
            assert_eq!(rows[0]["inserted"], 3);
        }
    }
}
