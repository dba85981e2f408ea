use std::cmp;

use bankbuddy_client::money::format_dollar_text;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct Column<'a> {
    pub name: &'a str,
    pub align: Align,
}

impl<'a> Column<'a> {
    pub const fn left(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Left,
        }
    }

    pub const fn right(name: &'a str) -> Self {
        Self {
            name,
            align: Align::Right,
        }
    }
}

const INDENT: usize = 2;
const COLUMN_GAP: usize = 2;
const MIN_COLUMN_WIDTH: usize = 6;

pub fn terminal_width() -> usize {
    let from_env = std::env::var("COLUMNS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(120);
    cmp::max(from_env, 40)
}

pub fn key_value_rows(entries: &[(&str, String)], indent: usize) -> Vec<String> {
    let label_width = entries
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);
    let padding = " ".repeat(indent);

    entries
        .iter()
        .map(|(label, value)| format!("{padding}{label:<label_width$}  {value}"))
        .collect()
}

/// Lays rows out as an aligned table. When the table is wider than
/// `max_width` the widest column is narrowed and its cells wrap; if that is
/// not enough, each row is printed as a labelled block instead.
pub fn render_table(
    columns: &[Column<'_>],
    rows: &[Vec<String>],
    max_width: usize,
    block_label: &str,
) -> Vec<String> {
    if columns.is_empty() {
        return Vec::new();
    }

    let budget = max_width
        .saturating_sub(INDENT)
        .saturating_sub(COLUMN_GAP * columns.len().saturating_sub(1));
    let Some(widths) = fit_widths(&natural_widths(columns, rows), columns, budget) else {
        return render_blocks(columns, rows, block_label);
    };

    let header = columns
        .iter()
        .map(|column| column.name.to_string())
        .collect::<Vec<String>>();
    let mut output = vec![format_line(columns, &header, &widths)];

    for row in rows {
        let wrapped = widths
            .iter()
            .enumerate()
            .map(|(index, width)| wrap(row.get(index).map(String::as_str).unwrap_or(""), *width))
            .collect::<Vec<Vec<String>>>();
        let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
        for line in 0..height {
            let cells = wrapped
                .iter()
                .map(|chunks| chunks.get(line).cloned().unwrap_or_default())
                .collect::<Vec<String>>();
            output.push(format_line(columns, &cells, &widths));
        }
    }

    output
}

fn natural_widths(columns: &[Column<'_>], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths = columns
        .iter()
        .map(|column| column.name.chars().count())
        .collect::<Vec<usize>>();
    for row in rows {
        for (index, value) in row.iter().enumerate() {
            if let Some(slot) = widths.get_mut(index) {
                *slot = cmp::max(*slot, value.chars().count());
            }
        }
    }
    widths
}

fn fit_widths(natural: &[usize], columns: &[Column<'_>], budget: usize) -> Option<Vec<usize>> {
    let floors = columns
        .iter()
        .map(|column| cmp::max(column.name.chars().count(), MIN_COLUMN_WIDTH))
        .collect::<Vec<usize>>();
    if floors.iter().sum::<usize>() > budget {
        return None;
    }

    let mut widths = natural.to_vec();
    let mut total = widths.iter().sum::<usize>();
    while total > budget {
        let widest = widths
            .iter()
            .enumerate()
            .filter(|(index, width)| **width > floors[*index])
            .max_by_key(|(_, width)| **width)
            .map(|(index, _)| index)?;
        widths[widest] -= 1;
        total -= 1;
    }
    Some(widths)
}

fn format_line(columns: &[Column<'_>], cells: &[String], widths: &[usize]) -> String {
    let pieces = columns
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(index, (column, width))| {
            let value = cells.get(index).map(String::as_str).unwrap_or("");
            let padding = width.saturating_sub(value.chars().count());
            match column.align {
                Align::Left => format!("{value}{}", " ".repeat(padding)),
                Align::Right => format!("{}{value}", " ".repeat(padding)),
            }
        })
        .collect::<Vec<String>>();
    format!("{}{}", " ".repeat(INDENT), pieces.join(&" ".repeat(COLUMN_GAP)))
        .trim_end()
        .to_string()
}

fn wrap(value: &str, width: usize) -> Vec<String> {
    if width == 0 || value.chars().count() <= width {
        return vec![value.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in value.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
            continue;
        }
        if current_len > 0 {
            lines.push(std::mem::take(&mut current));
        }
        if word_len <= width {
            current.push_str(word);
        } else {
            let chars = word.chars().collect::<Vec<char>>();
            for chunk in chars.chunks(width) {
                lines.push(chunk.iter().collect());
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn render_blocks(columns: &[Column<'_>], rows: &[Vec<String>], block_label: &str) -> Vec<String> {
    let labels = columns
        .iter()
        .map(|column| format!("{}:", column.name))
        .collect::<Vec<String>>();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut output = Vec::new();
    for (row_index, row) in rows.iter().enumerate() {
        if row_index > 0 {
            output.push(String::new());
        }
        output.push(format!("  {block_label} {}:", row_index + 1));
        for (column_index, label) in labels.iter().enumerate() {
            let value = row.get(column_index).map(String::as_str).unwrap_or("");
            output.push(format!("    {label:<label_width$}  {value}"));
        }
    }
    output
}

/// String field, or `-` when missing or null.
pub fn text(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => "-".to_string(),
    }
}

pub fn int(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_i64).unwrap_or(0)
}

/// Decimal field (serialized as a string) rendered as `-$12.34`.
pub fn dollars(value: &Value, key: &str) -> String {
    match value.get(key).and_then(Value::as_str) {
        Some(amount) => format_dollar_text(amount),
        None => "-".to_string(),
    }
}

/// `start to end` for a serialized date range, `N/A` when absent.
pub fn range(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(range) if range.is_object() => {
            format!("{} to {}", text(range, "start"), text(range, "end"))
        }
        _ => "N/A".to_string(),
    }
}

pub fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
