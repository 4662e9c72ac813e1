//! Usage signal trait and result types.

use async_trait::async_trait;
use schemalens_core::{DatabaseSchema, ObjectDependency, ObjectRef};
use schemalens_provider::{CancellationToken, DialectProvider};
use serde::{Deserialize, Serialize};

use crate::error::SignalError;

/// Everything a signal evaluator may consume.
///
/// Pure signals read the schema and edge facts; telemetry signals also query
/// the provider. The uptime is fetched once per run by the aggregator so
/// every uptime-gated signal sees the same value.
pub struct SignalContext<'a> {
    /// Schema snapshot for this run
    pub schema: &'a DatabaseSchema,

    /// Provider handle for telemetry queries
    pub provider: &'a dyn DialectProvider,

    /// Structural dependency facts (never the implicit candidates)
    pub edges: &'a [ObjectDependency],

    /// Engine uptime, when the engine tracks it
    pub uptime_secs: Option<u64>,

    /// Cancellation token for this run
    pub cancel: &'a CancellationToken,
}

/// One observation from one signal evaluator.
///
/// Ephemeral; discarded after aggregation. A positive weight is evidence of
/// use, a negative weight evidence of disuse.
#[derive(Debug, Clone)]
pub struct SignalResult {
    /// Observed object
    pub object: ObjectRef,

    /// Evidence weight
    pub weight: f64,

    /// Human-readable description of what was observed
    pub evidence: String,
}

impl SignalResult {
    /// Create a new observation.
    pub fn new(object: ObjectRef, weight: f64, evidence: impl Into<String>) -> Self {
        Self {
            object,
            weight,
            evidence: evidence.into(),
        }
    }
}

/// Usage classification levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageLevel {
    /// Strong evidence of active use
    Active,
    /// Some evidence of use, or weak evidence of disuse
    Low,
    /// Evidence points at disuse
    Unused,
    /// No signal fired; insufficient evidence either way
    Unknown,
}

impl UsageLevel {
    /// Stable string form used in report output.
    pub fn as_str(&self) -> &'static str {
        match self {
            UsageLevel::Active => "active",
            UsageLevel::Low => "low",
            UsageLevel::Unused => "unused",
            UsageLevel::Unknown => "unknown",
        }
    }
}

/// Aggregated usage classification for one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectUsage {
    /// Classified object
    pub object: ObjectRef,

    /// Summed weight across firing signals
    pub score: f64,

    /// Thresholded classification
    pub level: UsageLevel,

    /// Evidence strings from every contributing signal, retained for audit
    pub evidence: Vec<String>,
}

/// One independent evidence source.
///
/// Evaluators are registered with the aggregator and run concurrently; each
/// is independently fallible and independently skippable. Finding no
/// applicable evidence is `Ok(vec![])`, which is different from failing.
#[async_trait]
pub trait UsageSignal: Send + Sync {
    /// Short name used in logs and evidence attribution.
    fn name(&self) -> &'static str;

    /// Evaluate against one run's context.
    async fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Vec<SignalResult>, SignalError>;
}
