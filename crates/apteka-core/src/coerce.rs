//! # Lenient Field Coercion
//!
//! Serde helpers that absorb the provider's loose typing.
//!
//! The upstream inventory feed is not strongly typed: quantities arrive as
//! numbers or numeric strings, prices are sometimes null, dates are sometimes
//! blank strings. A strict deserializer would reject whole pages over one
//! sloppy field, so every tolerant field on [`crate::types::RawItem`] goes
//! through one of these helpers instead:
//!
//! | Helper                 | Accepts                       | On garbage |
//! |------------------------|-------------------------------|------------|
//! | `lenient_f64`          | number, numeric string, null  | `0.0`      |
//! | `lenient_opt_string`   | string, number, null          | `None`     |
//! | `lenient_opt_datetime` | RFC 3339, naive, date-only    | `None`     |
//!
//! All helpers are written for `#[serde(default, deserialize_with = "...")]`,
//! so a missing field never errors either.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Deserialize a numeric field that may arrive as a number, a numeric
/// string, or null. Anything unparseable becomes `0.0`.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_f64(&value))
}

fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

// =============================================================================
// Text Coercion
// =============================================================================

/// Deserialize an optional text field. Numbers are stringified (barcodes
/// sometimes arrive numeric), blank strings collapse to `None`.
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_opt_string(&value))
}

fn coerce_opt_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Date Coercion
// =============================================================================

/// Deserialize an optional timestamp field. Unparseable dates become `None`
/// rather than failing the page.
pub fn lenient_opt_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => parse_datetime(&s),
        _ => None,
    })
}

/// Parse a provider timestamp in any of the shapes seen in the feed.
///
/// Tries RFC 3339 first, then a naive `YYYY-MM-DDTHH:MM:SS` (the feed omits
/// the offset on some endpoints), then a bare `YYYY-MM-DD`. Naive values are
/// taken as UTC.
pub fn parse_datetime(input: &str) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive));
    }

    None
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_f64")]
        quantity: f64,
        #[serde(default, deserialize_with = "lenient_opt_string")]
        barcode: Option<String>,
        #[serde(default, deserialize_with = "lenient_opt_datetime")]
        shelf_life: Option<DateTime<Utc>>,
    }

    #[test]
    fn test_numeric_from_number_and_string() {
        let probe: Probe =
            serde_json::from_str(r#"{"quantity": 12.5, "barcode": null}"#).unwrap();
        assert_eq!(probe.quantity, 12.5);

        let probe: Probe = serde_json::from_str(r#"{"quantity": " 7 "}"#).unwrap();
        assert_eq!(probe.quantity, 7.0);
    }

    #[test]
    fn test_numeric_garbage_becomes_zero() {
        let probe: Probe = serde_json::from_str(r#"{"quantity": "N/A"}"#).unwrap();
        assert_eq!(probe.quantity, 0.0);

        let probe: Probe = serde_json::from_str(r#"{"quantity": null}"#).unwrap();
        assert_eq!(probe.quantity, 0.0);

        let probe: Probe = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(probe.quantity, 0.0);
    }

    #[test]
    fn test_string_from_number() {
        let probe: Probe =
            serde_json::from_str(r#"{"barcode": 4780000000000}"#).unwrap();
        assert_eq!(probe.barcode.as_deref(), Some("4780000000000"));
    }

    #[test]
    fn test_blank_string_collapses_to_none() {
        let probe: Probe = serde_json::from_str(r#"{"barcode": "   "}"#).unwrap();
        assert_eq!(probe.barcode, None);
    }

    #[test]
    fn test_datetime_shapes() {
        let probe: Probe =
            serde_json::from_str(r#"{"shelf_life": "2026-03-01T00:00:00Z"}"#).unwrap();
        assert!(probe.shelf_life.is_some());

        let probe: Probe =
            serde_json::from_str(r#"{"shelf_life": "2026-03-01T10:15:30"}"#).unwrap();
        assert!(probe.shelf_life.is_some());

        let probe: Probe =
            serde_json::from_str(r#"{"shelf_life": "2026-03-01"}"#).unwrap();
        assert!(probe.shelf_life.is_some());
    }

    #[test]
    fn test_invalid_datetime_is_none() {
        let probe: Probe =
            serde_json::from_str(r#"{"shelf_life": "soon"}"#).unwrap();
        assert_eq!(probe.shelf_life, None);

        let probe: Probe = serde_json::from_str(r#"{"shelf_life": ""}"#).unwrap();
        assert_eq!(probe.shelf_life, None);
    }

    #[test]
    fn test_parse_datetime_respects_offset() {
        let parsed = parse_datetime("2026-03-01T05:00:00+05:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T00:00:00+00:00");
    }
}
