//! Dependency-orphan signal.
//!
//! Pure structural evidence from the dependency fact set (never the implicit
//! candidates): an object no edge touches is probably forgotten; an object
//! referenced through several distinct relationship kinds (a foreign key
//! *and* a parsed body reference, say) is woven into the schema.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use schemalens_core::DetectedVia;

use crate::policy;
use crate::signal::{SignalContext, SignalResult, UsageSignal};
use crate::SignalError;

/// Structural edge participation evaluator.
pub struct DependencyOrphanSignal;

#[async_trait]
impl UsageSignal for DependencyOrphanSignal {
    fn name(&self) -> &'static str {
        "dependency-orphan"
    }

    async fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Vec<SignalResult>, SignalError> {
        ctx.cancel.check()?;

        let mut out_degree: HashMap<String, usize> = HashMap::new();
        let mut incoming_kinds: HashMap<String, HashSet<DetectedVia>> = HashMap::new();

        for edge in ctx.edges {
            *out_degree.entry(edge.from.canonical_key()).or_insert(0) += 1;
            incoming_kinds
                .entry(edge.to.canonical_key())
                .or_default()
                .insert(edge.via);
        }

        let mut results = Vec::new();
        for reference in ctx.schema.all_refs() {
            let key = reference.canonical_key();
            let outgoing = out_degree.get(&key).copied().unwrap_or(0);
            let incoming = incoming_kinds.get(&key).map_or(0, |k| k.len());

            if outgoing == 0 && incoming == 0 {
                results.push(SignalResult::new(
                    reference,
                    policy::WEIGHT_ORPHAN,
                    "no structural relationships to any other object",
                ));
            } else if incoming >= 2 {
                results.push(SignalResult::new(
                    reference,
                    policy::WEIGHT_MULTI_RELATION,
                    format!("referenced through {incoming} distinct relationship kinds"),
                ));
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_core::{DatabaseSchema, ObjectDependency, ObjectRef, Table};
    use schemalens_provider::{CancellationToken, MockData, MockProvider};

    fn bare_table(name: &str) -> Table {
        Table {
            database: None,
            schema: "dbo".to_string(),
            name: name.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_orphans_and_multi_relation_targets() {
        let schema = DatabaseSchema::new(
            None,
            vec![bare_table("Hub"), bare_table("Spoke"), bare_table("Island")],
            Vec::new(),
        )
        .unwrap();

        let edges = vec![
            ObjectDependency {
                from: ObjectRef::table("dbo", "Spoke"),
                to: ObjectRef::table("dbo", "Hub"),
                via: DetectedVia::ForeignKeyConstraint,
            },
            ObjectDependency {
                from: ObjectRef::table("dbo", "Spoke"),
                to: ObjectRef::table("dbo", "Hub"),
                via: DetectedVia::ParsedReference,
            },
        ];

        let provider = MockProvider::new(MockData::database("srv", "Sales"));
        let cancel = CancellationToken::new();
        let ctx = SignalContext {
            schema: &schema,
            provider: &provider,
            edges: &edges,
            uptime_secs: None,
            cancel: &cancel,
        };
        let results = DependencyOrphanSignal.evaluate(&ctx).await.unwrap();

        let hub = results.iter().find(|r| r.object.name == "Hub").unwrap();
        assert_eq!(hub.weight, policy::WEIGHT_MULTI_RELATION);

        let island = results.iter().find(|r| r.object.name == "Island").unwrap();
        assert_eq!(island.weight, policy::WEIGHT_ORPHAN);

        // Spoke has outgoing edges and a single incoming kind count of zero:
        // neither orphaned nor multiply referenced, so no signal at all.
        assert!(!results.iter().any(|r| r.object.name == "Spoke"));
    }
}
