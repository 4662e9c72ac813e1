//! Inference policy constants.
//!
//! Every tunable knob of implicit relationship inference lives here, in one
//! place, so the heuristic can be reviewed and adjusted without hunting
//! through the matcher. The values are covered by golden-style tests in
//! `implicit.rs`; changing one changes report output.

/// Identifier-style suffixes stripped from a column name to obtain the
/// candidate table stem. Matched case-insensitively, longest first, and the
/// remaining stem must be non-empty ("Id" alone never yields a candidate).
pub const ID_SUFFIXES: &[&str] = &["_code", "_key", "_id", "_no", "id"];

/// Confidence when the stem matches a table name exactly.
pub const CONFIDENCE_EXACT_STEM: f64 = 0.85;

/// Confidence when the stem matches a pluralized table name
/// (`Order` → `Orders`, `Status` → `Statuses`, `Category` → `Categories`).
pub const CONFIDENCE_PLURAL_STEM: f64 = 0.70;

/// Confidence when only a fuzzy match holds: the stem itself is plural and
/// its singular form matches the table name (`Customers` → `Customer`).
pub const CONFIDENCE_FUZZY_STEM: f64 = 0.55;

/// Deducted when the referencing column has no supporting index (no index
/// with that column in the leading position).
pub const PENALTY_NO_SUPPORTING_INDEX: f64 = 0.10;

/// Deducted when the column and the candidate key are both integers but of
/// different widths (`int` referencing a `bigint` key). Different type
/// families reject the candidate outright.
pub const PENALTY_INTEGER_WIDTH_MISMATCH: f64 = 0.15;

/// Candidates below this confidence are dropped entirely.
pub const MIN_CONFIDENCE: f64 = 0.30;
