//! Persisted-query-telemetry signal.
//!
//! Reads the durable query-statistics store, which survives engine restarts
//! and therefore needs no uptime gate. Two kinds of evidence come out of it:
//! per-object execution counts, and table references found in captured
//! ad-hoc query text. The text scan matches whole identifiers only; a hit
//! inside a longer identifier (`customer` inside `customer_archive`) does
//! not count.

use std::collections::HashMap;

use async_trait::async_trait;
use regex::Regex;
use schemalens_provider::PerformanceQueries;

use crate::policy;
use crate::signal::{SignalContext, SignalResult, UsageSignal};
use crate::SignalError;

/// Persisted query store evaluator.
pub struct QueryStoreSignal;

#[async_trait]
impl UsageSignal for QueryStoreSignal {
    fn name(&self) -> &'static str {
        "query-store"
    }

    async fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Vec<SignalResult>, SignalError> {
        ctx.cancel.check()?;
        let stats = ctx.provider.query_store_stats().await?;
        ctx.cancel.check()?;
        let texts = ctx.provider.query_store_texts().await?;

        let counts: HashMap<(String, String), i64> = stats
            .into_iter()
            .map(|s| {
                (
                    (s.schema.to_ascii_lowercase(), s.name.to_ascii_lowercase()),
                    s.execution_count,
                )
            })
            .collect();

        let mut results = Vec::new();

        // Object-level counters for everything the snapshot knows.
        for reference in ctx.schema.all_refs() {
            let key = (
                reference.schema.to_ascii_lowercase(),
                reference.name.to_ascii_lowercase(),
            );
            if let Some(&n) = counts.get(&key) {
                if n > 0 {
                    results.push(SignalResult::new(
                        reference,
                        policy::WEIGHT_QUERY_STORE_EXECUTED,
                        format!("{n} executions recorded in the persisted query store"),
                    ));
                }
            }
        }

        // Ad-hoc text attribution for tables that lack object-level stats.
        for table in ctx.schema.tables() {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(&table.name));
            let re = Regex::new(&pattern)
                .map_err(|e| SignalError::with_context("ad-hoc text scan", e.to_string()))?;
            let hits = texts.iter().filter(|t| re.is_match(t)).count();
            if hits > 0 {
                results.push(SignalResult::new(
                    table.object_ref(),
                    policy::WEIGHT_ADHOC_REFERENCE,
                    format!("referenced in {hits} captured ad-hoc queries"),
                ));
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_core::{Column, DatabaseSchema, Table};
    use schemalens_provider::{CancellationToken, MockData, MockProvider};

    fn table(name: &str) -> Table {
        Table {
            database: None,
            schema: "dbo".to_string(),
            name: name.to_string(),
            columns: vec![Column {
                name: "Id".to_string(),
                ordinal: 1,
                data_type: "int".to_string(),
                is_nullable: false,
                is_primary_key: true,
                is_identity: true,
                default_value: None,
            }],
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    async fn run(schema: &DatabaseSchema, data: MockData) -> Vec<SignalResult> {
        let provider = MockProvider::new(data);
        let cancel = CancellationToken::new();
        let ctx = SignalContext {
            schema,
            provider: &provider,
            edges: &[],
            uptime_secs: None,
            cancel: &cancel,
        };
        QueryStoreSignal.evaluate(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_adhoc_scan_requires_whole_identifier() {
        let schema = DatabaseSchema::new(
            None,
            vec![table("Customer"), table("Rental")],
            Vec::new(),
        )
        .unwrap();

        let mut data = MockData::database("srv", "Sales");
        data.query_store_texts = vec![
            "SELECT * FROM Customer WHERE Id = 1".to_string(),
            // Substring hits inside longer identifiers must not count.
            "SELECT * FROM CustomerArchive".to_string(),
            "SELECT RentalFee FROM Billing".to_string(),
        ];

        let results = run(&schema, data).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].object.name, "Customer");
        assert!(results[0].evidence.contains("1 captured"));
    }

    #[tokio::test]
    async fn test_object_level_counts() {
        let schema =
            DatabaseSchema::new(None, vec![table("Order")], Vec::new()).unwrap();

        let mut data = MockData::database("srv", "Sales");
        data.query_store_stats.push(schemalens_provider::QueryStoreStatsRow {
            schema: "dbo".to_string(),
            name: "Order".to_string(),
            kind: schemalens_core::ObjectKind::Table,
            execution_count: 7,
        });

        let results = run(&schema, data).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].weight, policy::WEIGHT_QUERY_STORE_EXECUTED);
    }
}
