//! Exact money handling. Amounts are `rust_decimal::Decimal` everywhere and
//! are stored as canonical two-place text so equal amounts compare equal in
//! SQL.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

pub const MONEY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount is empty")]
    Empty,
    #[error("amount `{0}` is not a number")]
    NotNumeric(String),
    #[error("amount `{0}` has more than two decimal places")]
    TooPrecise(String),
}

impl AmountParseError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Empty => "missing_required_field",
            Self::NotNumeric(_) => "invalid_number",
            Self::TooPrecise(_) => "invalid_amount_scale",
        }
    }
}

/// Parses a bank-export amount such as `-42.10`, `$1,234.56`, `+5` or
/// `(12.34)`.
pub fn parse_amount(raw: &str) -> Result<Decimal, AmountParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AmountParseError::Empty);
    }

    let (accounting_negative, inner) = match trimmed
        .strip_prefix('(')
        .and_then(|value| value.strip_suffix(')'))
    {
        Some(value) => (true, value.trim()),
        None => (false, trimmed),
    };

    let (sign_negative, unsigned) = if let Some(rest) = inner.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = inner.strip_prefix('+') {
        (false, rest)
    } else {
        (false, inner)
    };

    let digits = unsigned
        .trim()
        .trim_start_matches('$')
        .replace(',', "");
    if digits.is_empty() || digits.starts_with(['-', '+']) {
        return Err(AmountParseError::NotNumeric(trimmed.to_string()));
    }
    if !digits
        .chars()
        .all(|character| character.is_ascii_digit() || character == '.')
    {
        return Err(AmountParseError::NotNumeric(trimmed.to_string()));
    }
    if let Some((_, fraction)) = digits.split_once('.')
        && fraction.len() > MONEY_SCALE as usize
    {
        return Err(AmountParseError::TooPrecise(trimmed.to_string()));
    }

    let magnitude = Decimal::from_str(&digits)
        .map_err(|_| AmountParseError::NotNumeric(trimmed.to_string()))?;

    let value = if accounting_negative || sign_negative {
        -magnitude
    } else {
        magnitude
    };
    Ok(canonical(value))
}

/// Rescales to two places. Negative zero collapses to `0.00`.
pub fn canonical(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        return Decimal::new(0, MONEY_SCALE);
    }
    rounded.rescale(MONEY_SCALE);
    rounded
}

pub fn to_storage(value: Decimal) -> String {
    canonical(value).to_string()
}

pub fn from_storage(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok().map(canonical)
}

/// `-$12.34` / `$12.34`.
pub fn format_dollar(value: Decimal) -> String {
    let value = canonical(value);
    if value.is_sign_negative() {
        format!("-${}", value.abs())
    } else {
        format!("${value}")
    }
}

/// Formats a serialized decimal string; unparseable input is returned as-is.
pub fn format_dollar_text(value: &str) -> String {
    match from_storage(value) {
        Some(parsed) => format_dollar(parsed),
        None => value.to_string(),
    }
}
