use std::io;

use serde_json::Value;

use super::format;

pub fn render_report(data: &Value) -> io::Result<String> {
    let output_path = data
        .get("output_path")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("report output requires output_path"))?;
    let parameters = data.get("parameters").cloned().unwrap_or(Value::Null);
    let accounts = string_list(data, "accounts");
    let charts = string_list(data, "charts_embedded");

    let mut lines = vec![
        format!("Report written to {output_path}"),
        String::new(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("As of:", format::text(data, "as_of")),
            (
                "Split:",
                format!(
                    "{} {}% / {} {}%",
                    format::text(&parameters, "person1_name"),
                    format::text(&parameters, "person1_percentage"),
                    format::text(&parameters, "person2_name"),
                    format::text(&parameters, "person2_percentage"),
                ),
            ),
            ("Accounts:", joined_or_none(&accounts)),
            ("Charts:", joined_or_none(&charts)),
            ("Bytes:", format::int(data, "bytes_written").to_string()),
        ],
        2,
    ));
    Ok(lines.join("\n"))
}

fn string_list(data: &Value, key: &str) -> Vec<String> {
    format::array(data, key)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

fn joined_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(", ")
    }
}
