//! Relationship analyzer.
//!
//! Feeds the dependency graph engine with this database's edge facts and
//! runs implicit relationship inference over the snapshot. In server mode
//! the node universe is the union across extracted databases, so tagged
//! cross-database edges keep both endpoints.

use async_trait::async_trait;
use schemalens_core::{infer_implicit_relationships, DependencyGraph};
use tracing::debug;

use crate::analyzers::{collect_dependency_edges, Analyzer, AnalyzerContext, AnalyzerKind};
use crate::error::SessionError;
use crate::result::{AnalyzerSlice, RelationshipAnalysis};

/// Dependency graph and implicit relationship stage.
pub struct RelationshipAnalyzer;

#[async_trait]
impl Analyzer for RelationshipAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Relationships
    }

    async fn run(&self, ctx: &AnalyzerContext<'_>) -> Result<AnalyzerSlice, SessionError> {
        let edges = collect_dependency_edges(ctx).await?;
        ctx.cancel.check()?;

        // CPU-bound from here on; runs to completion without yielding.
        let graph = DependencyGraph::build(ctx.known_refs, &edges).analyze();
        let implicit = infer_implicit_relationships(ctx.schema);

        debug!(
            "relationship analysis: {} graph entries, {} cycles, {} implicit candidates",
            graph.dependencies.len(),
            graph.cycles.len(),
            implicit.len()
        );

        Ok(AnalyzerSlice::Relationships(RelationshipAnalysis {
            edges,
            graph,
            implicit,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_provider::{extract_schema, CancellationToken, MockData, MockProvider};

    fn order_fixture() -> MockData {
        MockData::database("srv", "Sales")
            .with_table("dbo", "Order", &[("Id", "int", true, true)])
            .with_table(
                "dbo",
                "OrderLine",
                &[("Id", "int", true, true), ("OrderId", "int", false, false)],
            )
            .with_table(
                "dbo",
                "Shipment",
                &[("Id", "int", true, true), ("OrderId", "int", false, false)],
            )
            .with_foreign_key("dbo", "OrderLine", "OrderId", "Order", "Id")
    }

    #[tokio::test]
    async fn test_graph_and_implicit_candidates() {
        let provider = MockProvider::new(order_fixture());
        let cancel = CancellationToken::new();
        let schema = extract_schema(&provider, &cancel, false).await.unwrap();
        let refs = schema.all_refs();
        let ctx = AnalyzerContext {
            provider: &provider,
            schema: &schema,
            known_refs: &refs,
            cancel: &cancel,
        };

        let AnalyzerSlice::Relationships(analysis) =
            RelationshipAnalyzer.run(&ctx).await.unwrap()
        else {
            panic!("wrong slice kind");
        };

        // One declared FK edge; Shipment is standalone.
        assert_eq!(analysis.edges.len(), 1);
        let order = analysis.graph.get("dbo.Order").unwrap();
        assert_eq!(order.importance_score, 3);
        assert!(analysis.graph.standalone.contains(&"dbo.Shipment".to_string()));

        // Shipment.OrderId is undeclared and matches Order: one candidate.
        // OrderLine.OrderId is covered by its declared FK and yields none.
        assert_eq!(analysis.implicit.len(), 1);
        assert_eq!(analysis.implicit[0].from_table.name, "Shipment");
        assert_eq!(analysis.implicit[0].to_table.name, "Order");
    }
}
