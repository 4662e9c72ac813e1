//! Signal aggregation.
//!
//! Runs every registered evaluator concurrently, folds the weighted evidence
//! per object, and thresholds the sums into usage levels. One evaluator
//! failing or being unavailable never blocks the others; it just contributes
//! no evidence.

use std::collections::HashMap;

use futures::future::join_all;
use schemalens_core::ObjectRef;
use tracing::{debug, warn};

use crate::policy;
use crate::signal::{ObjectUsage, SignalContext, UsageLevel, UsageSignal};
use crate::signals::{
    AccessStatsSignal, DependencyOrphanSignal, ExecutionStatsSignal, NamingPatternSignal,
    QueryStoreSignal, RowCountSignal,
};
use crate::SignalError;

/// Runs the signal set and aggregates per-object classifications.
pub struct UsageAnalyzer {
    signals: Vec<Box<dyn UsageSignal>>,
}

impl Default for UsageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageAnalyzer {
    /// Analyzer with the full built-in signal set.
    pub fn new() -> Self {
        Self::with_signals(vec![
            Box::new(ExecutionStatsSignal),
            Box::new(QueryStoreSignal),
            Box::new(AccessStatsSignal),
            Box::new(RowCountSignal),
            Box::new(DependencyOrphanSignal),
            Box::new(NamingPatternSignal),
        ])
    }

    /// Analyzer with an explicit signal set (tests, reduced scans).
    pub fn with_signals(signals: Vec<Box<dyn UsageSignal>>) -> Self {
        Self { signals }
    }

    /// Evaluate every signal and classify every object in the snapshot.
    ///
    /// Only cancellation aborts; any other per-signal failure is logged and
    /// degrades to absent evidence.
    pub async fn analyze(
        &self,
        ctx: &SignalContext<'_>,
    ) -> Result<Vec<ObjectUsage>, SignalError> {
        let outcomes = join_all(
            self.signals
                .iter()
                .map(|s| async move { (s.name(), s.evaluate(ctx).await) }),
        )
        .await;

        // key → (object, summed weight, evidence trail)
        let mut fired: HashMap<String, (ObjectRef, f64, Vec<String>)> = HashMap::new();

        for (name, outcome) in outcomes {
            match outcome {
                Ok(results) => {
                    debug!("signal '{}' produced {} observations", name, results.len());
                    for r in results {
                        let entry = fired
                            .entry(r.object.canonical_key())
                            .or_insert_with(|| (r.object.clone(), 0.0, Vec::new()));
                        entry.1 += r.weight;
                        entry.2.push(format!("[{name}] {}", r.evidence));
                    }
                }
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!("signal '{}' unavailable, continuing without it: {}", name, e);
                }
            }
        }

        let mut usages: Vec<ObjectUsage> = ctx
            .schema
            .all_refs()
            .into_iter()
            .map(|reference| match fired.remove(&reference.canonical_key()) {
                Some((object, score, evidence)) => ObjectUsage {
                    object,
                    score,
                    level: classify(score),
                    evidence,
                },
                // No signal fired: insufficient evidence, which is a
                // different statement than a neutral score.
                None => ObjectUsage {
                    object: reference,
                    score: 0.0,
                    level: UsageLevel::Unknown,
                    evidence: Vec::new(),
                },
            })
            .collect();

        // Most suspicious first.
        usages.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.object.canonical_key().cmp(&b.object.canonical_key()))
        });

        Ok(usages)
    }
}

fn classify(score: f64) -> UsageLevel {
    if score >= policy::ACTIVE_THRESHOLD {
        UsageLevel::Active
    } else if score < policy::UNUSED_THRESHOLD {
        UsageLevel::Unused
    } else {
        UsageLevel::Low
    }
}
