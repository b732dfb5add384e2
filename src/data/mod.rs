pub mod canonical;
pub mod ingestion;
pub mod raw;

pub use canonical::{CanonicalField, CanonicalRecord, CanonicalTable, Cell, Missing, Timestamp};
pub use ingestion::{JsonFileSupplier, RawTableSupplier};
pub use raw::{RawRow, RawTable, RawValue};
