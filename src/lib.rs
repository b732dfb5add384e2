//! Normalizes stock and crypto price tables from heterogeneous sources into one
//! canonical schema: `datetime`, `open`, `high`, `low`, `close`, `volume`,
//! `market_cap`.
//!
//! ```no_run
//! use quant_norm::{normalize, Domain, RawRow, RawTable};
//!
//! let raw = RawTable::from_rows(vec![RawRow::new()
//!     .with("time", 1_700_000_000_000_i64)
//!     .with("close", "100.5")]);
//! let table = normalize(&raw, Domain::Crypto)?;
//! assert_eq!(table.columns(), vec!["datetime", "close"]);
//! # Ok::<(), quant_norm::NormalizeError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod normalize;

pub use data::{
    CanonicalField, CanonicalRecord, CanonicalTable, Cell, JsonFileSupplier, Missing, RawRow,
    RawTable, RawTableSupplier, RawValue, Timestamp,
};
pub use error::{NormalizeError, ParseDomainError, RawTableError};
pub use normalize::{normalize, normalize_crypto, normalize_stock, Domain, Normalizer};
