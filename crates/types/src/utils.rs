//! Utility functions and helpers

use crate::{Result, SplitterError};
use chrono::NaiveDateTime;

/// Format used for persisted ledger timestamps, e.g. `2024-03-01T12:00:00`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Render a timestamp the way the ledger stores it
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored ledger timestamp
pub fn parse_timestamp(s: &str) -> std::result::Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| format!("Failed to parse timestamp '{}': {}", s, e))
}

/// Require a finite number, naming the field in the error
pub fn ensure_finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SplitterError::Validation(format!(
            "{} must be a finite number",
            field
        )))
    }
}

/// Require a finite, strictly positive amount
pub fn ensure_positive_amount(field: &str, value: f64) -> Result<f64> {
    let value = ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(SplitterError::Validation(format!(
            "{} must be greater than zero",
            field
        )));
    }
    Ok(value)
}

/// Sanitize string for logging (shorten wallet addresses)
pub fn sanitize_for_logging(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 12 {
        return s.to_string();
    }

    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = parse_timestamp("2024-03-01T08:15:30").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-01T08:15:30");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_amount_validation() {
        assert_eq!(ensure_positive_amount("amount", 12.5).unwrap(), 12.5);
        assert!(ensure_positive_amount("amount", 0.0).is_err());
        assert!(ensure_positive_amount("amount", -3.0).is_err());
        assert!(ensure_finite("value", f64::NAN).is_err());
        assert_eq!(ensure_finite("value", -1.0).unwrap(), -1.0);
    }

    #[test]
    fn test_sanitize_for_logging() {
        assert_eq!(
            sanitize_for_logging("collector.near.wallet.example"),
            "collec...mple"
        );
        assert_eq!(sanitize_for_logging("short"), "short");
    }
}
