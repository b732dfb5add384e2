use crate::normalize::Domain;
use thiserror::Error;

/// Structural failures that abort a normalization call.
///
/// Value-level problems never show up here; they are recorded per cell as
/// [`Missing`](crate::data::Missing).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("no datetime column found for {domain} data (tried {aliases:?}, available columns: {columns:?})")]
    SchemaResolution {
        domain: Domain,
        aliases: Vec<&'static str>,
        columns: Vec<String>,
    },
}

/// Failures while building a [`RawTable`](crate::data::RawTable) from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RawTableError {
    #[error("expected an array of records or an object of columns, found {0}")]
    UnsupportedLayout(&'static str),

    #[error("record {index} is a {found}, expected an object")]
    RecordNotObject { index: usize, found: &'static str },

    #[error("column {column:?} is a {found}, expected an array")]
    ColumnNotArray { column: String, found: &'static str },

    #[error("column {column:?} has {found} values but {first:?} has {expected}")]
    RaggedColumns {
        first: String,
        expected: usize,
        column: String,
        found: usize,
    },
}

/// Returned when a string does not name a known [`Domain`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown market domain {0:?}, expected \"stock\" or \"crypto\"")]
pub struct ParseDomainError(pub String);
