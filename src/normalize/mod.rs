pub mod coerce;
pub mod domain;
pub mod resolver;

pub use domain::{AliasTable, Domain};
pub use resolver::resolve_columns;

use crate::data::{CanonicalField, CanonicalRecord, CanonicalTable, Missing, RawRow, RawTable};
use crate::error::NormalizeError;
use tracing::warn;

/// Turns raw market tables into canonical ones for a single domain.
///
/// `Normalizer` holds no state besides its domain; each call works only on the
/// table it is given, so one instance can be shared freely across threads.
///
/// # Volume units
/// Volume is passed through as-is and assumed to be in units of the traded
/// asset. If a source reports volume in quote currency, converting it is up to
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    domain: Domain,
}

impl Normalizer {
    pub fn new(domain: Domain) -> Self {
        Self { domain }
    }

    pub fn stock() -> Self {
        Self::new(Domain::Stock)
    }

    pub fn crypto() -> Self {
        Self::new(Domain::Crypto)
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Normalizes a raw table into the canonical schema.
    ///
    /// Resolves source columns against the domain's alias table, then decodes
    /// every row. Only columns that resolved appear in the output.
    ///
    /// # Arguments
    /// * `raw`: The raw table as produced by a supplier
    ///
    /// # Errors
    /// Returns [`NormalizeError::SchemaResolution`] if no column can serve as
    /// the datetime. Bad individual values never fail the call; they become
    /// missing cells.
    ///
    /// # Returns
    /// A `CanonicalTable` with one record per raw row, in input order
    #[tracing::instrument(skip(self, raw), fields(domain = %self.domain, rows = raw.len()))]
    pub fn normalize(&self, raw: &RawTable) -> Result<CanonicalTable, NormalizeError> {
        let resolution = resolve_columns(raw.columns(), self.domain)?;

        let records = raw
            .rows()
            .iter()
            .map(|row| self.normalize_row(row, &resolution))
            .collect();

        let table = CanonicalTable::new(self.domain, resolution, records);
        report_invalid_cells(&table);
        Ok(table)
    }

    fn normalize_row(
        &self,
        row: &RawRow,
        resolution: &[(CanonicalField, String)],
    ) -> CanonicalRecord {
        let mut record = CanonicalRecord::default();

        for (field, source) in resolution {
            let value = row.get(source);
            match field {
                CanonicalField::Datetime => {
                    record.datetime = match self.domain {
                        Domain::Stock => coerce::parse_calendar(value),
                        Domain::Crypto => coerce::parse_epoch_millis(value),
                    };
                }
                numeric => {
                    if let Some(cell) = record.numeric_mut(*numeric) {
                        *cell = coerce::coerce_number(value);
                    }
                }
            }
        }

        record
    }
}

/// Normalizes `raw` for `domain`. See [`Normalizer::normalize`].
pub fn normalize(raw: &RawTable, domain: Domain) -> Result<CanonicalTable, NormalizeError> {
    Normalizer::new(domain).normalize(raw)
}

/// Normalizes a stock table: calendar-string dates, no `price` alias.
pub fn normalize_stock(raw: &RawTable) -> Result<CanonicalTable, NormalizeError> {
    Normalizer::stock().normalize(raw)
}

/// Normalizes a crypto table: epoch-millisecond times, `price` read as close.
pub fn normalize_crypto(raw: &RawTable) -> Result<CanonicalTable, NormalizeError> {
    Normalizer::crypto().normalize(raw)
}

fn report_invalid_cells(table: &CanonicalTable) {
    for field in table.fields() {
        let invalid = table
            .records()
            .iter()
            .filter(|record| match field {
                CanonicalField::Datetime => matches!(record.datetime, Err(Missing::Invalid(_))),
                numeric => matches!(record.numeric(numeric), Some(Err(Missing::Invalid(_)))),
            })
            .count();

        if invalid > 0 {
            warn!(
                field = %field,
                source = table.source_column(field).unwrap_or_default(),
                invalid,
                "values could not be coerced and were left missing"
            );
        }
    }
}
