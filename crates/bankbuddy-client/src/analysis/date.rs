use chrono::{Datelike, Duration, NaiveDate};

use crate::{ClientError, ClientResult};

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn month_key(date: &NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Parses a stored `posted_at` value.
pub fn parse_transaction_date(value: &str) -> Option<NaiveDate> {
    if !looks_like_iso_date(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parses the date shapes banks put in CSV exports: `YYYY-MM-DD`,
/// `MM/DD/YYYY`, `M/D/YYYY` and `MM/DD/YY`.
pub fn parse_export_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if looks_like_iso_date(trimmed) {
        return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok();
    }

    let parts = trimmed.split('/').collect::<Vec<&str>>();
    let [month, day, year] = parts.as_slice() else {
        return None;
    };
    let all_digits = [month, day, year]
        .iter()
        .all(|part| !part.is_empty() && part.chars().all(|character| character.is_ascii_digit()));
    if !all_digits || month.len() > 2 || day.len() > 2 {
        return None;
    }

    let month = month.parse::<u32>().ok()?;
    let day = day.parse::<u32>().ok()?;
    let year = match year.len() {
        4 => year.parse::<i32>().ok()?,
        2 => 2000 + year.parse::<i32>().ok()?,
        _ => return None,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses a user-supplied `YYYY-MM-DD` argument.
pub fn parse_iso_date_strict(value: &str, field_name: &str, command: &str) -> ClientResult<NaiveDate> {
    if !looks_like_iso_date(value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with valid calendar values."),
            Some(command),
        )
    })
}

/// True when `date` falls in the trailing window `(as_of - days, as_of]`.
/// A window reaching before the earliest representable date has no lower
/// bound.
pub fn within_trailing_window(date: NaiveDate, as_of: NaiveDate, days: i64) -> bool {
    let start = Duration::try_days(days).and_then(|span| as_of.checked_sub_signed(span));
    date <= as_of && start.is_none_or(|start| date > start)
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{month_key, parse_export_date, parse_iso_date_strict, within_trailing_window};

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn export_dates_accept_bank_formats() {
        assert_eq!(parse_export_date("2025-01-07"), date(2025, 1, 7));
        assert_eq!(parse_export_date("01/07/2025"), date(2025, 1, 7));
        assert_eq!(parse_export_date("1/7/2025"), date(2025, 1, 7));
        assert_eq!(parse_export_date("01/07/25"), date(2025, 1, 7));
        assert_eq!(parse_export_date(" 12/31/2024 "), date(2024, 12, 31));
    }

    #[test]
    fn export_dates_reject_impossible_values() {
        assert_eq!(parse_export_date("02/30/2025"), None);
        assert_eq!(parse_export_date("2025/01/07"), None);
        assert_eq!(parse_export_date("yesterday"), None);
        assert_eq!(parse_export_date("1/7/025"), None);
    }

    #[test]
    fn strict_parse_reports_the_command() {
        let result = parse_iso_date_strict("07/01/2025", "as_of", "analyze");
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
        }
    }

    #[test]
    fn trailing_window_excludes_its_start() {
        let as_of = date(2025, 3, 31);
        assert!(as_of.is_some());
        if let (Some(as_of), Some(edge), Some(inside)) = (as_of, date(2025, 3, 1), date(2025, 3, 2)) {
            assert!(!within_trailing_window(edge, as_of, 30));
            assert!(within_trailing_window(edge, as_of, 1_000_000_000));
            assert!(within_trailing_window(edge, as_of, i64::MAX));
            assert!(within_trailing_window(inside, as_of, 30));
            assert!(within_trailing_window(as_of, as_of, 30));
            assert_eq!(month_key(&as_of), "2025-03");
        }
    }
}
