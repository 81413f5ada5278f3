//! Shared primitive types used across the entire pipeline.

/// A stable, unique identifier for any entity in the datasets
/// (e.g. `c:1234` for a company, `f:77` for a financial org).
pub type EntityId = String;

/// A region code from the offices dataset (US state code in practice).
pub type RegionCode = String;

/// A column header in a record table.
pub type ColumnName = String;
