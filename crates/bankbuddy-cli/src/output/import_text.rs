use std::io;

use serde_json::Value;

use super::accounts_text::type_label;
use super::format::{self, Column};

pub fn render_import_run(data: &Value) -> io::Result<String> {
    let dry_run = data
        .get("dry_run")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let summary = data
        .get("summary")
        .filter(|value| value.is_object())
        .ok_or_else(|| io::Error::other("import output requires summary"))?;
    let files = format::array(data, "files");

    let mut lines = vec![if dry_run {
        "Dry run completed. Nothing was written to the ledger.".to_string()
    } else {
        "Import completed successfully.".to_string()
    }];
    if let Some(message) = data.get("message").and_then(Value::as_str)
        && !message.is_empty()
    {
        lines.push(message.to_string());
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    lines.extend(format::key_value_rows(
        &[
            ("Source:", format::text(data, "path")),
            ("Files:", files.len().to_string()),
            ("Rows read:", format::int(summary, "rows_read").to_string()),
            ("Rows valid:", format::int(summary, "rows_valid").to_string()),
            ("Rows invalid:", format::int(summary, "rows_invalid").to_string()),
            (
                if dry_run { "Would insert:" } else { "Inserted:" },
                format::int(summary, "inserted").to_string(),
            ),
            ("Duplicates:", format::int(summary, "deduped").to_string()),
        ],
        2,
    ));

    if !files.is_empty() {
        lines.push(String::new());
        lines.push("Files:".to_string());
        lines.extend(render_file_table(files));
    }

    for file in files {
        let duplicates = render_duplicates(file);
        if !duplicates.is_empty() {
            lines.push(String::new());
            lines.extend(duplicates);
        }
        let issues = render_issues(file);
        if !issues.is_empty() {
            lines.push(String::new());
            lines.extend(issues);
        }
    }

    if !dry_run && let Some(data_range) = data.get("data_range") {
        let earliest = data_range.get("earliest").and_then(Value::as_str);
        let latest = data_range.get("latest").and_then(Value::as_str);
        if let (Some(earliest), Some(latest)) = (earliest, latest) {
            lines.push(String::new());
            lines.push(format!("Ledger now covers {earliest} to {latest}."));
        }
    }

    lines.push(String::new());
    lines.extend(render_next_actions(data));
    Ok(lines.join("\n"))
}

pub fn render_import_list(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("import list output requires rows"))?;

    if rows.is_empty() {
        return Ok([
            "No imports found yet.",
            "",
            "Run your first import:",
            "  1. buddy import create --help",
            "  2. buddy import create --dry-run <path>",
            "  3. buddy import create <path>",
        ]
        .join("\n"));
    }

    let count_label = if rows.len() == 1 {
        "1 import found.".to_string()
    } else {
        format!("{} imports found.", rows.len())
    };
    let columns = [
        Column::left("Import ID"),
        Column::left("Account"),
        Column::left("Created"),
        Column::right("Read"),
        Column::right("Inserted"),
        Column::right("Dupes"),
        Column::right("Invalid"),
        Column::left("Source"),
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                format::text(row, "import_id"),
                format::text(row, "account_key"),
                format::text(row, "created_at"),
                format::int(row, "rows_read").to_string(),
                format::int(row, "inserted").to_string(),
                format::int(row, "deduped").to_string(),
                format::int(row, "rows_invalid").to_string(),
                format::text(row, "source_ref"),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![count_label, String::new()];
    lines.extend(format::render_table(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Import",
    ));
    Ok(lines.join("\n"))
}

fn render_file_table(files: &[Value]) -> Vec<String> {
    let columns = [
        Column::left("File"),
        Column::left("Account"),
        Column::left("Type"),
        Column::right("Read"),
        Column::right("Inserted"),
        Column::right("Dupes"),
        Column::right("Invalid"),
    ];
    let rows = files
        .iter()
        .map(|file| {
            let summary = file.get("summary").cloned().unwrap_or(Value::Null);
            vec![
                file_name(&format::text(file, "source_ref")),
                format::text(file, "account_key"),
                type_label(file),
                format::int(&summary, "rows_read").to_string(),
                format::int(&summary, "inserted").to_string(),
                format::int(&summary, "deduped").to_string(),
                format::int(&summary, "rows_invalid").to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    format::render_table(&columns, &rows, format::terminal_width(), "File")
}

fn render_duplicates(file: &Value) -> Vec<String> {
    let Some(preview) = file.get("duplicates_preview") else {
        return Vec::new();
    };
    let rows = format::array(preview, "rows");
    if rows.is_empty() {
        return Vec::new();
    }

    let total = file
        .get("duplicate_summary")
        .map(|summary| format::int(summary, "total"))
        .unwrap_or(rows.len() as i64);
    let truncated = preview
        .get("truncated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let name = file_name(&format::text(file, "source_ref"));
    let heading = if truncated {
        format!(
            "Duplicates skipped in {name} (showing first {} of {total}):",
            rows.len()
        )
    } else {
        format!("Duplicates skipped in {name}:")
    };

    let columns = [
        Column::right("Row"),
        Column::left("Date"),
        Column::right("Amount"),
        Column::left("Description"),
        Column::left("Matched"),
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                format::int(row, "source_row_index").to_string(),
                format::text(row, "posted_at"),
                format::dollars(row, "amount"),
                format::text(row, "description"),
                duplicate_match(row),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![heading];
    lines.extend(format::render_table(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Duplicate",
    ));
    lines
}

fn duplicate_match(row: &Value) -> String {
    match row.get("dedupe_reason").and_then(Value::as_str) {
        Some("batch") => match row.get("matched_batch_row_index").and_then(Value::as_i64) {
            Some(index) => format!("row {index} of this file"),
            None => "earlier row of this file".to_string(),
        },
        _ => match row.get("matched_txn_id").and_then(Value::as_str) {
            Some(txn_id) => format!("ledger {txn_id}"),
            None => "existing ledger row".to_string(),
        },
    }
}

fn render_issues(file: &Value) -> Vec<String> {
    let issues = format::array(file, "issues");
    if issues.is_empty() {
        return Vec::new();
    }

    let name = file_name(&format::text(file, "source_ref"));
    let columns = [
        Column::right("Row"),
        Column::left("Field"),
        Column::left("Problem"),
    ];
    let rows = issues
        .iter()
        .map(|issue| {
            let mut problem = format::text(issue, "description");
            if let Some(received) = issue.get("received").and_then(Value::as_str) {
                problem.push_str(&format!(" (got `{received}`)"));
            }
            vec![
                format::int(issue, "row").to_string(),
                format::text(issue, "field"),
                problem,
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![format!("Rows skipped in {name}:")];
    lines.extend(format::render_table(
        &columns,
        &rows,
        format::terminal_width(),
        "Issue",
    ));
    lines
}

fn render_next_actions(data: &Value) -> Vec<String> {
    let mut lines = vec!["Next step:".to_string()];
    match data.get("next_step") {
        Some(next_step) if next_step.is_object() => {
            lines.push(format!("  {}:", format::text(next_step, "label")));
            lines.push(format!("  {}", format::text(next_step, "command")));
        }
        _ => lines.push("  Run `buddy analyze`.".to_string()),
    }

    let actions = format::array(data, "other_actions");
    if !actions.is_empty() {
        lines.push(String::new());
        lines.push("Other actions:".to_string());
        for action in actions {
            lines.push(format!(
                "  - {}: {}",
                format::text(action, "label"),
                format::text(action, "command")
            ));
        }
    }
    lines
}

fn file_name(source_ref: &str) -> String {
    std::path::Path::new(source_ref)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source_ref.to_string())
}
