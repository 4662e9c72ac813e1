//! Dependency edge facts.
//!
//! An [`ObjectDependency`] is an asserted, directed `from → to` fact produced
//! once per run, either from a declared foreign key or from a parsed object
//! reference (a view or procedure body naming another object). Facts are
//! never mutated; implicit relationship *candidates* live in a separate type
//! and are never merged into this set.

use serde::{Deserialize, Serialize};

use crate::ObjectRef;

/// How a dependency edge was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectedVia {
    /// Declared foreign key constraint
    ForeignKeyConstraint,
    /// Reference parsed out of an object body (view, procedure, trigger)
    ParsedReference,
}

impl DetectedVia {
    /// Stable string form used in report output.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedVia::ForeignKeyConstraint => "foreign_key",
            DetectedVia::ParsedReference => "parsed_reference",
        }
    }
}

/// A directed dependency edge between two schema objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectDependency {
    /// Depending object (the edge source)
    pub from: ObjectRef,

    /// Depended-upon object (the edge target)
    pub to: ObjectRef,

    /// Detection mechanism
    pub via: DetectedVia,
}

impl ObjectDependency {
    /// Whether the edge spans two databases.
    ///
    /// Only meaningful in server mode, where refs carry database qualifiers.
    pub fn is_cross_database(&self) -> bool {
        match (&self.from.database, &self.to.database) {
            (Some(a), Some(b)) => !a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}
