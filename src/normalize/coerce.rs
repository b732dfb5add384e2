//! Per-cell conversions from raw source values to canonical cells.
//!
//! None of these fail: a value that cannot be converted becomes a
//! [`Missing`] cell and the rest of the row is unaffected.

use crate::data::{Cell, Missing, RawValue, Timestamp};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d"];

/// Coerces a cell to a float.
///
/// Integers and floats pass through, numeric strings are parsed after trimming.
/// Nulls, blank strings and NaN read as [`Missing::Null`]; anything else is
/// [`Missing::Invalid`].
pub fn coerce_number(value: Option<&RawValue>) -> Cell<f64> {
    match value {
        None | Some(RawValue::Null) => Err(Missing::Null),
        Some(RawValue::Integer(integer)) => Ok(*integer as f64),
        Some(RawValue::Number(number)) => not_nan(*number),
        Some(RawValue::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(Missing::Null);
            }
            match trimmed.parse::<f64>() {
                Ok(number) => not_nan(number),
                Err(_) => Err(Missing::Invalid(text.clone())),
            }
        }
        Some(RawValue::Timestamp(timestamp)) => Err(Missing::Invalid(timestamp.to_string())),
    }
}

fn not_nan(number: f64) -> Cell<f64> {
    if number.is_nan() {
        Err(Missing::Null)
    } else {
        Ok(number)
    }
}

/// Parses a calendar date or date-time string from a stock source.
///
/// Strings carrying an offset are converted to UTC. Strings without one are
/// kept naive; no zone is assumed. Bare numbers are not calendar values and
/// are rejected.
pub fn parse_calendar(value: Option<&RawValue>) -> Cell<Timestamp> {
    let text = match value {
        None | Some(RawValue::Null) => return Err(Missing::Null),
        Some(RawValue::Timestamp(timestamp)) => return Ok(*timestamp),
        Some(RawValue::Text(text)) => text,
        Some(other) => return Err(Missing::Invalid(other.to_string())),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Missing::Null);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(Timestamp::Utc(instant.with_timezone(&Utc)));
    }
    for format in OFFSET_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(trimmed, format) {
            return Ok(Timestamp::Utc(instant.with_timezone(&Utc)));
        }
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(Timestamp::Naive(naive));
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(Timestamp::Naive(midnight));
            }
        }
    }

    Err(Missing::Invalid(text.clone()))
}

/// Parses milliseconds since the Unix epoch from a crypto source into UTC.
///
/// Accepts integers, floats (sub-millisecond digits are truncated) and numeric
/// strings. Values already carrying a timestamp are taken as is, with naive
/// ones read as UTC. RFC 3339 strings, as written by
/// [`CanonicalTable::to_json_records`](crate::data::CanonicalTable::to_json_records),
/// are read back as the instant they name.
pub fn parse_epoch_millis(value: Option<&RawValue>) -> Cell<Timestamp> {
    match value {
        None | Some(RawValue::Null) => Err(Missing::Null),
        Some(RawValue::Timestamp(Timestamp::Naive(naive))) => {
            Ok(Timestamp::Utc(Utc.from_utc_datetime(naive)))
        }
        Some(RawValue::Timestamp(timestamp)) => Ok(*timestamp),
        Some(RawValue::Integer(millis)) => from_millis(*millis, || millis.to_string()),
        Some(RawValue::Number(number)) => from_float_millis(*number, || number.to_string()),
        Some(RawValue::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(Missing::Null);
            }
            if let Ok(millis) = trimmed.parse::<i64>() {
                return from_millis(millis, || text.clone());
            }
            if let Ok(number) = trimmed.parse::<f64>() {
                return from_float_millis(number, || text.clone());
            }
            match DateTime::parse_from_rfc3339(trimmed) {
                Ok(instant) => Ok(Timestamp::Utc(instant.with_timezone(&Utc))),
                Err(_) => Err(Missing::Invalid(text.clone())),
            }
        }
    }
}

fn from_millis(millis: i64, raw: impl FnOnce() -> String) -> Cell<Timestamp> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(Timestamp::Utc)
        .ok_or_else(|| Missing::Invalid(raw()))
}

fn from_float_millis(millis: f64, raw: impl FnOnce() -> String) -> Cell<Timestamp> {
    if millis.is_nan() {
        return Err(Missing::Null);
    }
    let truncated = millis.trunc();
    if !truncated.is_finite() || truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(Missing::Invalid(raw()));
    }
    from_millis(truncated as i64, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> RawValue {
        RawValue::from(value)
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> Timestamp {
        Timestamp::Naive(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, s)
                .unwrap(),
        )
    }

    #[test]
    fn test_coerce_number_accepts_numeric_forms() {
        assert_eq!(coerce_number(Some(&RawValue::Integer(10))), Ok(10.0));
        assert_eq!(coerce_number(Some(&RawValue::Number(2.5))), Ok(2.5));
        assert_eq!(coerce_number(Some(&text(" 100.5 "))), Ok(100.5));
        assert_eq!(coerce_number(Some(&text("1e3"))), Ok(1000.0));
    }

    #[test]
    fn test_coerce_number_degrades_to_missing() {
        assert_eq!(coerce_number(None), Err(Missing::Null));
        assert_eq!(coerce_number(Some(&RawValue::Null)), Err(Missing::Null));
        assert_eq!(coerce_number(Some(&text("   "))), Err(Missing::Null));
        assert_eq!(coerce_number(Some(&text("NaN"))), Err(Missing::Null));
        assert_eq!(
            coerce_number(Some(&text("bad"))),
            Err(Missing::Invalid("bad".to_string()))
        );
        assert_eq!(
            coerce_number(Some(&text("1,000"))),
            Err(Missing::Invalid("1,000".to_string()))
        );
    }

    #[test]
    fn test_parse_calendar_dates_stay_naive() {
        assert_eq!(
            parse_calendar(Some(&text("2024-01-02"))),
            Ok(naive(2024, 1, 2, 0, 0, 0))
        );
        assert_eq!(
            parse_calendar(Some(&text("01/02/2024"))),
            Ok(naive(2024, 1, 2, 0, 0, 0))
        );
        assert_eq!(
            parse_calendar(Some(&text("2024-01-02 15:30:00"))),
            Ok(naive(2024, 1, 2, 15, 30, 0))
        );
        assert_eq!(
            parse_calendar(Some(&text("2024-01-02T15:30"))),
            Ok(naive(2024, 1, 2, 15, 30, 0))
        );
    }

    #[test]
    fn test_parse_calendar_accepts_compact_dates() {
        assert_eq!(
            parse_calendar(Some(&text("20240102"))),
            Ok(naive(2024, 1, 2, 0, 0, 0))
        );
        assert_eq!(
            parse_calendar(Some(&text("20241399"))),
            Err(Missing::Invalid("20241399".to_string()))
        );
    }

    #[test]
    fn test_parse_calendar_converts_offsets_to_utc() {
        let parsed = parse_calendar(Some(&text("2024-01-02T09:30:00-05:00"))).unwrap();

        assert_eq!(
            parsed.as_utc(),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 14, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_parse_calendar_rejects_garbage_per_cell() {
        assert_eq!(
            parse_calendar(Some(&text("yesterday"))),
            Err(Missing::Invalid("yesterday".to_string()))
        );
        assert_eq!(
            parse_calendar(Some(&RawValue::Integer(20240102))),
            Err(Missing::Invalid("20240102".to_string()))
        );
        assert_eq!(parse_calendar(Some(&text(""))), Err(Missing::Null));
    }

    #[test]
    fn test_parse_epoch_millis() {
        let expected = Ok(Timestamp::Utc(
            Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap(),
        ));

        assert_eq!(
            parse_epoch_millis(Some(&RawValue::Integer(1_700_000_000_000))),
            expected
        );
        assert_eq!(
            parse_epoch_millis(Some(&RawValue::Number(1_700_000_000_000.0))),
            expected
        );
        assert_eq!(parse_epoch_millis(Some(&text("1700000000000"))), expected);
    }

    #[test]
    fn test_parse_epoch_millis_reads_rfc3339_text() {
        assert_eq!(
            parse_epoch_millis(Some(&text("2023-11-14T22:13:20Z"))),
            Ok(Timestamp::Utc(
                Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
            ))
        );
        assert_eq!(
            parse_epoch_millis(Some(&text("2023-11-15T00:13:20+02:00"))),
            Ok(Timestamp::Utc(
                Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
            ))
        );
    }

    #[test]
    fn test_parse_epoch_millis_failures_are_per_cell() {
        assert_eq!(parse_epoch_millis(None), Err(Missing::Null));
        assert_eq!(
            parse_epoch_millis(Some(&text("2024-01-02"))),
            Err(Missing::Invalid("2024-01-02".to_string()))
        );
        assert!(matches!(
            parse_epoch_millis(Some(&RawValue::Number(1e30))),
            Err(Missing::Invalid(_))
        ));
        assert!(matches!(
            parse_epoch_millis(Some(&RawValue::Integer(i64::MAX))),
            Err(Missing::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_epoch_millis_reads_naive_timestamps_as_utc() {
        let parsed = parse_epoch_millis(Some(&RawValue::Timestamp(naive(2024, 1, 2, 0, 0, 0))));

        assert_eq!(
            parsed.unwrap().as_utc(),
            Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap())
        );
    }
}
