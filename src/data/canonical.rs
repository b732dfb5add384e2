use super::raw::{RawRow, RawTable, RawValue};
use crate::normalize::Domain;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// A point in time as recovered from a source column.
///
/// Crypto sources deliver epoch milliseconds, which pin down an instant in UTC.
/// Stock sources usually deliver bare calendar dates with no zone attached; those
/// stay naive rather than being silently assumed to be UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Timestamp {
    Naive(NaiveDateTime),
    Utc(DateTime<Utc>),
}

impl Timestamp {
    /// Returns the UTC instant, if the timestamp carries zone information.
    pub fn as_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Utc(instant) => Some(*instant),
            Timestamp::Naive(_) => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Naive(naive) => write!(f, "{}", naive.format("%Y-%m-%dT%H:%M:%S%.f")),
            Timestamp::Utc(instant) => {
                write!(f, "{}", instant.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Timestamp::Utc(instant)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(naive: NaiveDateTime) -> Self {
        Timestamp::Naive(naive)
    }
}

/// The fixed column set every normalized table is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Datetime,
    Open,
    High,
    Low,
    Close,
    Volume,
    MarketCap,
}

impl CanonicalField {
    /// All fields in canonical output order.
    pub const ALL: [CanonicalField; 7] = [
        CanonicalField::Datetime,
        CanonicalField::Open,
        CanonicalField::High,
        CanonicalField::Low,
        CanonicalField::Close,
        CanonicalField::Volume,
        CanonicalField::MarketCap,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Datetime => "datetime",
            CanonicalField::Open => "open",
            CanonicalField::High => "high",
            CanonicalField::Low => "low",
            CanonicalField::Close => "close",
            CanonicalField::Volume => "volume",
            CanonicalField::MarketCap => "market_cap",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a canonical cell holds no value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Missing {
    /// No source column matched the field's aliases.
    #[error("no source column")]
    Unresolved,
    /// The source cell was null, empty or absent from the row.
    #[error("null")]
    Null,
    /// The source cell could not be coerced; holds the raw rendering.
    #[error("could not coerce {0:?}")]
    Invalid(String),
}

/// A canonical cell: either a value or the reason it is missing.
pub type Cell<T> = Result<T, Missing>;

/// One normalized row.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub datetime: Cell<Timestamp>,
    pub open: Cell<f64>,
    pub high: Cell<f64>,
    pub low: Cell<f64>,
    pub close: Cell<f64>,
    /// Traded volume in units of the underlying asset.
    pub volume: Cell<f64>,
    pub market_cap: Cell<f64>,
}

impl Default for CanonicalRecord {
    fn default() -> Self {
        Self {
            datetime: Err(Missing::Unresolved),
            open: Err(Missing::Unresolved),
            high: Err(Missing::Unresolved),
            low: Err(Missing::Unresolved),
            close: Err(Missing::Unresolved),
            volume: Err(Missing::Unresolved),
            market_cap: Err(Missing::Unresolved),
        }
    }
}

impl CanonicalRecord {
    /// Returns the numeric cell for `field`, or `None` for `datetime`.
    pub fn numeric(&self, field: CanonicalField) -> Option<&Cell<f64>> {
        match field {
            CanonicalField::Datetime => None,
            CanonicalField::Open => Some(&self.open),
            CanonicalField::High => Some(&self.high),
            CanonicalField::Low => Some(&self.low),
            CanonicalField::Close => Some(&self.close),
            CanonicalField::Volume => Some(&self.volume),
            CanonicalField::MarketCap => Some(&self.market_cap),
        }
    }

    pub(crate) fn numeric_mut(&mut self, field: CanonicalField) -> Option<&mut Cell<f64>> {
        match field {
            CanonicalField::Datetime => None,
            CanonicalField::Open => Some(&mut self.open),
            CanonicalField::High => Some(&mut self.high),
            CanonicalField::Low => Some(&mut self.low),
            CanonicalField::Close => Some(&mut self.close),
            CanonicalField::Volume => Some(&mut self.volume),
            CanonicalField::MarketCap => Some(&mut self.market_cap),
        }
    }

    /// True when the cell for `field` is missing for any reason.
    pub fn is_missing(&self, field: CanonicalField) -> bool {
        match field {
            CanonicalField::Datetime => self.datetime.is_err(),
            numeric => self.numeric(numeric).map_or(true, |cell| cell.is_err()),
        }
    }
}

/// The result of normalizing one raw table.
///
/// Only fields that were resolved against a source column appear as columns;
/// every record still carries all seven cells, with unresolved ones set to
/// [`Missing::Unresolved`].
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    domain: Domain,
    resolution: Vec<(CanonicalField, String)>,
    records: Vec<CanonicalRecord>,
}

impl CanonicalTable {
    pub(crate) fn new(
        domain: Domain,
        resolution: Vec<(CanonicalField, String)>,
        records: Vec<CanonicalRecord>,
    ) -> Self {
        Self {
            domain,
            resolution,
            records,
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Canonical column names present in this table, in canonical order.
    pub fn columns(&self) -> Vec<&'static str> {
        self.fields().map(|field| field.as_str()).collect()
    }

    pub fn fields(&self) -> impl Iterator<Item = CanonicalField> + '_ {
        self.resolution.iter().map(|(field, _)| *field)
    }

    pub fn has_field(&self, field: CanonicalField) -> bool {
        self.source_column(field).is_some()
    }

    /// The source column that was consumed for `field`, if any.
    pub fn source_column(&self, field: CanonicalField) -> Option<&str> {
        self.resolution
            .iter()
            .find(|(resolved, _)| *resolved == field)
            .map(|(_, column)| column.as_str())
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of missing cells in `field`; zero for unresolved fields.
    pub fn null_count(&self, field: CanonicalField) -> usize {
        if !self.has_field(field) {
            return 0;
        }
        self.records
            .iter()
            .filter(|record| record.is_missing(field))
            .count()
    }

    /// Renders the table as JSON records holding only the resolved columns.
    ///
    /// Missing cells and non-finite numbers become `null`.
    pub fn to_json_records(&self) -> Value {
        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut object = Map::new();
                for field in self.fields() {
                    let value = match field {
                        CanonicalField::Datetime => match &record.datetime {
                            Ok(timestamp) => Value::String(timestamp.to_string()),
                            Err(_) => Value::Null,
                        },
                        numeric => match record.numeric(numeric) {
                            Some(Ok(number)) => serde_json::Number::from_f64(*number)
                                .map(Value::Number)
                                .unwrap_or(Value::Null),
                            _ => Value::Null,
                        },
                    };
                    object.insert(field.as_str().to_string(), value);
                }
                Value::Object(object)
            })
            .collect();
        Value::Array(rows)
    }

    /// Re-expresses the table as raw input under canonical column names.
    ///
    /// Invalid cells are written back as their raw text so that normalizing the
    /// result reproduces the same records.
    pub fn to_raw(&self) -> RawTable {
        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut row = RawRow::new();
                for field in self.fields() {
                    let value = match field {
                        CanonicalField::Datetime => match &record.datetime {
                            Ok(timestamp) => RawValue::Timestamp(*timestamp),
                            Err(missing) => missing_to_raw(missing),
                        },
                        numeric => match record.numeric(numeric) {
                            Some(Ok(number)) => RawValue::Number(*number),
                            Some(Err(missing)) => missing_to_raw(missing),
                            None => RawValue::Null,
                        },
                    };
                    row.insert(field.as_str(), value);
                }
                row
            })
            .collect();

        let mut table = RawTable::from_rows(rows);
        if table.is_empty() {
            // Keep the header so an empty canonical table still resolves.
            for field in self.fields() {
                table.declare_column(field.as_str());
            }
        }
        table
    }
}

fn missing_to_raw(missing: &Missing) -> RawValue {
    match missing {
        Missing::Invalid(raw) => RawValue::Text(raw.clone()),
        Missing::Null | Missing::Unresolved => RawValue::Null,
    }
}
