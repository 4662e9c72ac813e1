//! Analysis result types.
//!
//! The per-session cache holds one [`AnalysisResult`]: one
//! [`DatabaseAnalysis`] per successfully analyzed database plus the
//! partial-failure record for server mode. Single-analyzer re-runs replace
//! one slice of one database's entry, never the whole result.

use schemalens_core::{
    DatabaseSchema, DependencyAnalysis, ImplicitRelationship, ObjectDependency, ObjectRef,
};
use schemalens_provider::Dialect;
use schemalens_usage::ObjectUsage;
use serde::{Deserialize, Serialize};

/// Data-profile entry for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEntry {
    /// Profiled table
    pub object: ObjectRef,

    /// Row count, when the provider could produce one
    pub row_count: Option<i64>,

    /// Number of columns
    pub column_count: usize,

    /// Number of indexes
    pub index_count: usize,

    /// Whether a primary key is declared
    pub has_primary_key: bool,
}

/// Severity grades for quality findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One structural quality finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityFinding {
    /// Affected object
    pub object: ObjectRef,

    /// Stable finding code, e.g. `missing_primary_key`
    pub code: String,

    /// Human-readable description
    pub message: String,

    /// Severity grade
    pub severity: Severity,
}

/// Output of the relationship analyzer for one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipAnalysis {
    /// Dependency edge facts the graph was built from
    pub edges: Vec<ObjectDependency>,

    /// Graph engine output: per-object entries, cycles, standalone objects
    pub graph: DependencyAnalysis,

    /// Implicit relationship candidates, confidence descending
    pub implicit: Vec<ImplicitRelationship>,
}

/// One analyzer's slice of a database analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "analyzer", content = "data", rename_all = "snake_case")]
pub enum AnalyzerSlice {
    Schema(DatabaseSchema),
    Profile(Vec<ProfileEntry>),
    Quality(Vec<QualityFinding>),
    Relationships(RelationshipAnalysis),
    Usage(Vec<ObjectUsage>),
}

/// All analyzer output for one database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseAnalysis {
    /// Database name; `None` in single-database sessions where the provider
    /// did not report one
    pub database: Option<String>,

    /// Schema snapshot everything below was computed from
    pub schema: DatabaseSchema,

    /// Data profile slice
    pub profile: Option<Vec<ProfileEntry>>,

    /// Quality findings slice
    pub quality: Option<Vec<QualityFinding>>,

    /// Relationship analysis slice
    pub relationships: Option<RelationshipAnalysis>,

    /// Usage classification slice
    pub usage: Option<Vec<ObjectUsage>>,
}

impl DatabaseAnalysis {
    /// A fresh entry holding only the schema snapshot.
    pub fn from_schema(database: Option<String>, schema: DatabaseSchema) -> Self {
        Self {
            database,
            schema,
            profile: None,
            quality: None,
            relationships: None,
            usage: None,
        }
    }

    /// Drop every derived slice, keeping only the schema. Used when the
    /// schema is re-fetched: stale derived entities are never exposed.
    pub fn invalidate_derived(&mut self) {
        self.profile = None;
        self.quality = None;
        self.relationships = None;
        self.usage = None;
    }
}

/// Record of one database that failed in server mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseFailure {
    /// Database name
    pub database: String,

    /// Error text
    pub error: String,
}

/// Top-level cached result of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Server or instance name
    pub server_name: String,

    /// Dialect the session speaks
    pub dialect: Dialect,

    /// Whether this run spanned all databases on the server
    pub server_mode: bool,

    /// Successfully analyzed databases
    pub databases: Vec<String>,

    /// Databases that failed (server mode); never aborts the siblings
    pub failed_databases: Vec<DatabaseFailure>,

    /// Per-database analyzer output
    pub results: Vec<DatabaseAnalysis>,
}

impl AnalysisResult {
    /// Find the entry for a database, or the sole entry of a
    /// single-database session when `database` is `None`.
    pub fn database_analysis(&self, database: Option<&str>) -> Option<&DatabaseAnalysis> {
        match database {
            Some(name) => self
                .results
                .iter()
                .find(|r| r.database.as_deref() == Some(name)),
            None => self.results.first(),
        }
    }

    /// Mutable variant of [`AnalysisResult::database_analysis`].
    pub fn database_analysis_mut(
        &mut self,
        database: Option<&str>,
    ) -> Option<&mut DatabaseAnalysis> {
        match database {
            Some(name) => self
                .results
                .iter_mut()
                .find(|r| r.database.as_deref() == Some(name)),
            None => self.results.first_mut(),
        }
    }
}
