//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use shopbag_core::types::Won;

/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Content hash of `main.css`, computed by the build script.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Format a plain integer amount as won.
///
/// Usage in templates: `{{ coupon.min_value|won }}`
#[askama::filter_fn]
pub fn won(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_won(&value.to_string()))
}

fn format_won(raw: &str) -> String {
    raw.trim()
        .parse::<i64>()
        .map_or_else(|_| raw.to_string(), |amount| Won::new(amount).to_string())
}

/// Calendar date of a backend timestamp.
///
/// Usage in templates: `{{ coupon.expired_at|date }}`
#[askama::filter_fn]
pub fn date(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(calendar_date(&value.to_string()))
}

fn calendar_date(raw: &str) -> String {
    let raw = raw.trim();
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date())
        })
        .map_or_else(|_| raw.split('T').next().unwrap_or(raw).to_string(), |d| {
            d.format("%Y-%m-%d").to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_won_amounts() {
        assert_eq!(format_won("12345"), "12,345원");
        assert_eq!(format_won("0"), "0원");
        assert_eq!(format_won("n/a"), "n/a");
    }

    #[test]
    fn test_calendar_date() {
        assert_eq!(calendar_date("2024-03-05T10:20:30"), "2024-03-05");
        assert_eq!(calendar_date("2024-03-05T10:20:30.123456"), "2024-03-05");
        assert_eq!(calendar_date("2024-03-05T10:20:30+09:00"), "2024-03-05");
        assert_eq!(calendar_date("2024-03-05"), "2024-03-05");
        assert_eq!(calendar_date(""), "");
    }
}
