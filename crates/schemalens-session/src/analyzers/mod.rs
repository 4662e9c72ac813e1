//! Analyzer registry.
//!
//! Analyzers are a closed trait set registered in a fixed collection at
//! startup, never via runtime type inspection. Schema extraction is the pipeline
//! precursor and is driven directly by the orchestrator; the analyzers here
//! are the mutually independent downstream stages that consume the snapshot
//! and run concurrently.

mod profile;
mod quality;
mod relationships;
mod usage;

use async_trait::async_trait;
use schemalens_core::{DatabaseSchema, ObjectDependency, ObjectRef};
use schemalens_provider::{reference_edges, CancellationToken, CatalogQueries, DialectProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::error::SessionError;
use crate::result::AnalyzerSlice;

pub use profile::ProfileAnalyzer;
pub use quality::QualityAnalyzer;
pub use relationships::RelationshipAnalyzer;
pub use usage::UsageAnalyzerStage;

/// Analyzer identifiers, also the request vocabulary of
/// `run_single_analyzer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    /// Schema extraction (pipeline precursor)
    Schema,
    /// Data profile (row counts, structural counts)
    Profile,
    /// Structural quality findings
    Quality,
    /// Dependency graph and implicit relationships
    Relationships,
    /// Usage classification
    Usage,
}

impl AnalyzerKind {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyzerKind::Schema => "schema",
            AnalyzerKind::Profile => "profile",
            AnalyzerKind::Quality => "quality",
            AnalyzerKind::Relationships => "relationships",
            AnalyzerKind::Usage => "usage",
        }
    }

    /// Every analyzer, pipeline order first.
    pub fn all() -> &'static [AnalyzerKind] {
        &[
            AnalyzerKind::Schema,
            AnalyzerKind::Profile,
            AnalyzerKind::Quality,
            AnalyzerKind::Relationships,
            AnalyzerKind::Usage,
        ]
    }
}

impl std::fmt::Display for AnalyzerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalyzerKind {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "schema" => Ok(Self::Schema),
            "profile" => Ok(Self::Profile),
            "quality" => Ok(Self::Quality),
            "relationships" => Ok(Self::Relationships),
            "usage" => Ok(Self::Usage),
            other => Err(SessionError::UnknownAnalyzer(other.to_string())),
        }
    }
}

/// Everything a downstream analyzer may consume.
pub struct AnalyzerContext<'a> {
    /// Provider bound to the database under analysis
    pub provider: &'a dyn DialectProvider,

    /// Schema snapshot for this database
    pub schema: &'a DatabaseSchema,

    /// Object universe for edge filtering: the union across all extracted
    /// databases in server mode, this schema's refs otherwise
    pub known_refs: &'a [ObjectRef],

    /// Cancellation token for this run
    pub cancel: &'a CancellationToken,
}

/// One downstream analyzer stage.
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Which slice this analyzer produces.
    fn kind(&self) -> AnalyzerKind;

    /// Run against one database's context.
    async fn run(&self, ctx: &AnalyzerContext<'_>) -> Result<AnalyzerSlice, SessionError>;
}

/// The downstream analyzer set in registration order.
pub fn downstream_analyzers() -> Vec<Box<dyn Analyzer>> {
    vec![
        Box::new(ProfileAnalyzer),
        Box::new(QualityAnalyzer),
        Box::new(RelationshipAnalyzer),
        Box::new(UsageAnalyzerStage),
    ]
}

/// Collect the dependency fact set for one database: declared foreign keys
/// plus backend-detected references, filtered to endpoints the run knows
/// about (the graph engine treats a dangling endpoint as programmer error).
pub(crate) async fn collect_dependency_edges(
    ctx: &AnalyzerContext<'_>,
) -> Result<Vec<ObjectDependency>, SessionError> {
    ctx.cancel.check()?;

    let mut edges = ctx.schema.foreign_key_edges();

    match ctx.provider.list_references().await {
        Ok(rows) => {
            let database = if ctx.schema.is_qualified() {
                ctx.schema.database.as_deref()
            } else {
                None
            };
            edges.extend(reference_edges(&rows, database));
        }
        Err(e) if e.is_degradable() => {
            warn!("object references unavailable, graph uses foreign keys only: {e}");
        }
        Err(e) => return Err(e.into()),
    }

    let known: HashSet<String> = ctx.known_refs.iter().map(|r| r.canonical_key()).collect();
    edges.retain(|edge| {
        let keep = known.contains(&edge.from.canonical_key())
            && known.contains(&edge.to.canonical_key());
        if !keep {
            warn!(
                "dropping edge {} -> {}: endpoint outside the analyzed object set",
                edge.from.canonical_key(),
                edge.to.canonical_key()
            );
        }
        keep
    });

    Ok(edges)
}
