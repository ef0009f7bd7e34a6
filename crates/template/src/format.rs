//! Value formatting for number, date and checkbox fields

use crate::ValidationError;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::{self, Write};

/// Decimal number pattern such as `#,##0.##`
///
/// Before the point, `0` forces a digit, `#` allows one and a `,` turns on
/// thousands grouping. After the point, each `0` is a digit that is always
/// shown and each `#` a digit that is dropped when it is a trailing zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pattern: String,
    grouping: bool,
    min_integer_digits: usize,
    min_fraction_digits: usize,
    max_fraction_digits: usize,
}

impl NumberFormat {
    /// Default pattern: comma grouping, at most two decimals
    pub const DEFAULT_PATTERN: &'static str = "#,##0.##";

    pub fn parse(pattern: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidNumberFormat(pattern.to_string());

        if pattern.is_empty() || !pattern.chars().all(|c| matches!(c, '#' | '0' | ',' | '.')) {
            return Err(invalid());
        }

        let (integer, fraction) = match pattern.split_once('.') {
            Some((integer, fraction)) => (integer, fraction),
            None => (pattern, ""),
        };
        if fraction.contains(['.', ',']) {
            return Err(invalid());
        }
        // A forced digit may not follow an optional one
        if fraction.trim_start_matches('0').contains('0') {
            return Err(invalid());
        }
        if !integer.contains(['#', '0']) && fraction.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            pattern: pattern.to_string(),
            grouping: integer.contains(','),
            min_integer_digits: integer.matches('0').count(),
            min_fraction_digits: fraction.matches('0').count(),
            max_fraction_digits: fraction.len(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format a finite value
    pub fn format(&self, value: f64) -> String {
        let rounded = format!("{:.*}", self.max_fraction_digits, value.abs());
        let (integer, fraction) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));

        let mut fraction = fraction.to_string();
        while fraction.len() > self.min_fraction_digits && fraction.ends_with('0') {
            fraction.pop();
        }

        let mut integer = integer.trim_start_matches('0').to_string();
        if integer.len() < self.min_integer_digits {
            integer = format!("{integer:0>width$}", width = self.min_integer_digits);
        }
        if integer.is_empty() && fraction.is_empty() {
            integer.push('0');
        }
        if self.grouping {
            integer = group_thousands(&integer);
        }

        let is_zero = !integer.chars().chain(fraction.chars()).any(|c| c.is_ascii_digit() && c != '0');
        let sign = if value < 0.0 && !is_zero { "-" } else { "" };

        if fraction.is_empty() {
            format!("{sign}{integer}")
        } else {
            format!("{sign}{integer}.{fraction}")
        }
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            pattern: Self::DEFAULT_PATTERN.to_string(),
            grouping: true,
            min_integer_digits: 1,
            min_fraction_digits: 0,
            max_fraction_digits: 2,
        }
    }
}

impl fmt::Display for NumberFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Insert `,` between groups of three digits
fn group_thousands(digits: &str) -> String {
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// strftime-style output pattern for date fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
}

impl DateFormat {
    /// Default pattern: day-month-year
    pub const DEFAULT_PATTERN: &'static str = "%d-%m-%Y";

    /// Accept a pattern only if it can format a date-time without a time zone
    pub fn parse(pattern: &str) -> Result<Self, ValidationError> {
        let probe = NaiveDate::from_ymd_opt(2000, 1, 1)
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .ok_or_else(|| ValidationError::InvalidDateFormat(pattern.to_string()))?;

        let mut out = String::new();
        if pattern.is_empty() || write!(out, "{}", probe.format(pattern)).is_err() {
            return Err(ValidationError::InvalidDateFormat(pattern.to_string()));
        }

        Ok(Self {
            pattern: pattern.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn format(&self, value: &NaiveDateTime) -> String {
        let mut out = String::new();
        // Pattern was checked in `parse`
        let _ = write!(out, "{}", value.format(&self.pattern));
        out
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: Self::DEFAULT_PATTERN.to_string(),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

const DATE_TIME_INPUTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_INPUTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parse a number cell, allowing `,` thousands separators
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Format a number cell, `None` when it is not a finite number
pub fn format_number(raw: &str, format: &NumberFormat) -> Option<String> {
    parse_number(raw).map(|value| format.format(value))
}

/// Parse a date cell in one of the accepted layouts
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATE_TIME_INPUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .or_else(|| {
            DATE_INPUTS
                .iter()
                .find_map(|layout| NaiveDate::parse_from_str(raw, layout).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Format a date cell, `None` when it is not a recognised date
pub fn format_date(raw: &str, format: &DateFormat) -> Option<String> {
    parse_date(raw).map(|value| format.format(&value))
}

/// Interpret a checkbox cell
pub fn parse_checkbox(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "x" | "checked" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Render a checkbox cell: `X` when ticked, nothing otherwise
pub fn format_checkbox(raw: &str) -> Option<String> {
    parse_checkbox(raw).map(|checked| if checked { "X".to_string() } else { String::new() })
}

const ELLIPSIS: &str = "...";

/// Cut text down to roughly `max_width` points, ending it with `...`
///
/// Glyph widths are estimated at `0.6 × font_size`. When the width cannot
/// even hold the ellipsis, the text is cut without one.
pub fn truncate_to_width(text: &str, max_width: f64, font_size: f32) -> String {
    let average_width = f64::from(font_size) * 0.6;
    let max_chars = (max_width / average_width).floor() as usize;

    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    if max_chars < ELLIPSIS.len() {
        return text.chars().take(max_chars).collect();
    }

    let mut truncated: String = text.chars().take(max_chars - ELLIPSIS.len()).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
