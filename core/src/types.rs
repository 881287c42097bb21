//! Shared primitive types used across the pipeline.

/// A stable, unique loan identifier.
pub type LoanId = String;

/// Index of a row within the derived dataset.
pub type RowIndex = usize;

/// Days between two calendar dates. Negative for past maturities.
pub type Days = i64;
