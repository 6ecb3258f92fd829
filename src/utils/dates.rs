use chrono::{Local, NaiveDate};

use crate::error::AppError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's local calendar date as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Validates a `YYYY-MM-DD` date and returns it in canonical form.
pub fn parse_date(raw: &str) -> Result<String, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map(|d| d.format(DATE_FORMAT).to_string())
        .map_err(|_| AppError::bad_request(format!("Invalid date {raw:?}, expected YYYY-MM-DD")))
}

/// Query-string date: blank or missing falls back to today.
pub fn date_or_today(raw: Option<&str>) -> Result<String, AppError> {
    match raw.map(str::trim) {
        Some(d) if !d.is_empty() => parse_date(d),
        _ => Ok(today()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_calendar_dates() {
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("01/02/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn canonicalizes_dates() {
        assert_eq!(parse_date(" 2024-1-5 ").unwrap(), "2024-01-05");
    }

    #[test]
    fn blank_date_means_today() {
        assert_eq!(date_or_today(Some("  ")).unwrap(), today());
        assert_eq!(date_or_today(None).unwrap(), today());
        assert_eq!(date_or_today(Some("2024-01-01")).unwrap(), "2024-01-01");
    }
}
