use crate::data::Timestamp;
use crate::error::RawTableError;
use serde_json::Value;
use std::fmt;

/// A single scalar cell as handed over by a raw table supplier.
///
/// Suppliers rarely agree on how they encode values: the same close price may
/// arrive as `101.5`, `"101.5"` or `null`, and a date as a string, an epoch
/// number or an already-parsed timestamp. `RawValue` keeps the value exactly as
/// received so that coercion can happen per canonical field.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
    Timestamp(Timestamp),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Null => write!(f, "null"),
            RawValue::Integer(value) => write!(f, "{}", value),
            RawValue::Number(value) => write!(f, "{}", value),
            RawValue::Text(value) => write!(f, "{}", value),
            RawValue::Timestamp(value) => write!(f, "{}", value),
        }
    }
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Number(number) => match number.as_i64() {
                Some(integer) => RawValue::Integer(integer),
                None => number
                    .as_f64()
                    .map(RawValue::Number)
                    .unwrap_or_else(|| RawValue::Text(number.to_string())),
            },
            Value::String(text) => RawValue::Text(text),
            other => RawValue::Text(other.to_string()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<Timestamp> for RawValue {
    fn from(value: Timestamp) -> Self {
        RawValue::Timestamp(value)
    }
}

/// One row of a raw table: source column names mapped to values, in the
/// order the supplier produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, RawValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `column` to `value`, replacing an existing cell with the exact same name.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<RawValue>) {
        let column = column.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(name, _)| *name == column) {
            Some((_, cell)) => *cell = value,
            None => self.cells.push((column, value)),
        }
    }

    /// Builder form of [`RawRow::insert`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Looks up a cell by its exact source column name.
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<RawValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// An arbitrary tabular input whose column names are defined by its source.
///
/// The column set is the union of all row keys in first-seen order. Rows are
/// allowed to omit columns; an omitted cell reads as null during normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from rows, collecting the column set as it goes.
    pub fn from_rows(rows: Vec<RawRow>) -> Self {
        let mut table = Self::new();
        table.push_rows(rows);
        table
    }

    /// Builds a table from a JSON document.
    ///
    /// Two layouts are accepted, matching what market data APIs usually return
    /// once the envelope is stripped:
    /// * records: `[{"time": 1, "close": "2"}, ...]`
    /// * columns: `{"time": [1, ...], "close": ["2", ...]}`
    ///
    /// Keys keep their document order, so the column set follows the order in
    /// which names first appear in the JSON text.
    ///
    /// # Errors
    /// Returns an error if the document is neither layout, if a record is not an
    /// object, or if column arrays differ in length.
    pub fn from_json(document: Value) -> Result<Self, RawTableError> {
        match document {
            Value::Array(records) => {
                let mut table = Self::new();
                for (index, record) in records.into_iter().enumerate() {
                    match record {
                        Value::Object(fields) => table.push_row(fields.into_iter().collect()),
                        other => {
                            return Err(RawTableError::RecordNotObject {
                                index,
                                found: json_kind(&other),
                            })
                        }
                    }
                }
                Ok(table)
            }
            Value::Object(columns) => {
                let mut series = Vec::with_capacity(columns.len());
                let mut height: Option<(String, usize)> = None;

                for (column, values) in columns {
                    let values = match values {
                        Value::Array(values) => values,
                        other => {
                            return Err(RawTableError::ColumnNotArray {
                                column,
                                found: json_kind(&other),
                            })
                        }
                    };

                    let found = values.len();
                    if let Some((first, expected)) = &height {
                        if *expected != found {
                            return Err(RawTableError::RaggedColumns {
                                first: first.clone(),
                                expected: *expected,
                                column,
                                found,
                            });
                        }
                    }
                    if height.is_none() {
                        height = Some((column.clone(), found));
                    }
                    series.push((column, values.into_iter()));
                }

                let height = height.map(|(_, len)| len).unwrap_or(0);
                let mut table = Self::new();
                for (column, _) in &series {
                    table.declare_column(column.as_str());
                }
                for _ in 0..height {
                    let row = series
                        .iter_mut()
                        .filter_map(|(column, values)| {
                            values.next().map(|value| (column.clone(), RawValue::from(value)))
                        })
                        .collect();
                    table.rows.push(row);
                }
                Ok(table)
            }
            other => Err(RawTableError::UnsupportedLayout(json_kind(&other))),
        }
    }

    pub fn push_row(&mut self, row: RawRow) {
        for column in row.columns() {
            if !self.columns.iter().any(|known| known == column) {
                self.columns.push(column.to_string());
            }
        }
        self.rows.push(row);
    }

    pub fn push_rows(&mut self, rows: impl IntoIterator<Item = RawRow>) {
        for row in rows {
            self.push_row(row);
        }
    }

    /// Adds `column` to the column set without adding any rows.
    pub fn declare_column(&mut self, column: impl Into<String>) {
        let column = column.into();
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_follow_first_seen_order() {
        let table = RawTable::from_rows(vec![
            RawRow::new().with("Date", "2024-01-02").with("Close", 10.0),
            RawRow::new().with("Date", "2024-01-03").with("Volume", 5_i64),
        ]);

        assert_eq!(table.columns(), ["Date", "Close", "Volume"]);
        assert_eq!(table.len(), 2);
        assert!(table.rows()[1].get("Close").is_none());
    }

    #[test]
    fn test_insert_replaces_exact_name_only() {
        let mut row = RawRow::new().with("close", 1.0);
        row.insert("close", 2.0);
        row.insert("Close", 3.0);

        assert_eq!(row.len(), 2);
        assert_eq!(row.get("close"), Some(&RawValue::Number(2.0)));
        assert_eq!(row.get("Close"), Some(&RawValue::Number(3.0)));
    }

    #[test]
    fn test_from_json_records() {
        let table = RawTable::from_json(json!([
            {"time": 1700000000000_i64, "close": "100.5"},
            {"time": 1700000060000_i64, "close": null, "vol": 2.5}
        ]))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0].get("time"),
            Some(&RawValue::Integer(1_700_000_000_000))
        );
        assert_eq!(table.rows()[0].get("close"), Some(&RawValue::from("100.5")));
        assert_eq!(table.rows()[1].get("close"), Some(&RawValue::Null));
        assert_eq!(table.rows()[1].get("vol"), Some(&RawValue::Number(2.5)));
        assert!(table.columns().iter().any(|c| c == "vol"));
    }

    #[test]
    fn test_from_json_columns() {
        let table = RawTable::from_json(json!({
            "date": ["2024-01-02", "2024-01-03"],
            "close": [10, "11"]
        }))
        .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1].get("date"), Some(&RawValue::from("2024-01-03")));
        assert_eq!(table.rows()[0].get("close"), Some(&RawValue::Integer(10)));
    }

    #[test]
    fn test_from_json_keeps_document_key_order() {
        let records = RawTable::from_json(json!([
            {"time": 1, "Close": "2", "close": "3"},
            {"vol": 4, "time": 5}
        ]))
        .unwrap();
        let columns = RawTable::from_json(json!({
            "volume": [1],
            "date": ["2024-01-02"],
            "Close": [2]
        }))
        .unwrap();

        assert_eq!(records.columns(), ["time", "Close", "close", "vol"]);
        assert_eq!(columns.columns(), ["volume", "date", "Close"]);
    }

    #[test]
    fn test_from_json_rejects_ragged_columns() {
        let err = RawTable::from_json(json!({
            "close": [1, 2, 3],
            "date": ["2024-01-02"]
        }))
        .unwrap_err();

        assert!(matches!(err, RawTableError::RaggedColumns { .. }));
    }

    #[test]
    fn test_from_json_rejects_scalars() {
        assert!(matches!(
            RawTable::from_json(json!(42)),
            Err(RawTableError::UnsupportedLayout("number"))
        ));
        assert!(matches!(
            RawTable::from_json(json!([{"close": 1}, "oops"])),
            Err(RawTableError::RecordNotObject { index: 1, .. })
        ));
    }

    #[test]
    fn test_non_scalar_json_becomes_text() {
        assert_eq!(RawValue::from(json!(true)), RawValue::from("true"));
        assert_eq!(RawValue::from(json!([1, 2])), RawValue::from("[1,2]"));
    }
}
