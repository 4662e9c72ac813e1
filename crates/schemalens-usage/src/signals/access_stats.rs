//! Access-statistics signal.
//!
//! Table-level read/write counters, reset at engine start. Nonzero activity
//! is positive evidence after a short uptime window; all-zero counters are
//! negative evidence only after a longer window, since a freshly restarted
//! engine has zeros everywhere.

use std::collections::HashMap;

use async_trait::async_trait;
use schemalens_provider::PerformanceQueries;

use crate::policy;
use crate::signal::{SignalContext, SignalResult, UsageSignal};
use crate::SignalError;

/// Read/write counter evaluator.
pub struct AccessStatsSignal;

#[async_trait]
impl UsageSignal for AccessStatsSignal {
    fn name(&self) -> &'static str {
        "access-stats"
    }

    async fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Vec<SignalResult>, SignalError> {
        ctx.cancel.check()?;
        let stats = ctx.provider.access_stats().await?;

        let counters: HashMap<(String, String), (i64, i64)> = stats
            .into_iter()
            .map(|s| {
                (
                    (s.schema.to_ascii_lowercase(), s.table.to_ascii_lowercase()),
                    (s.reads, s.writes),
                )
            })
            .collect();

        let uptime = ctx.uptime_secs;
        let positive_window = uptime.is_some_and(|u| u >= policy::MIN_UPTIME_FOR_ACCESS_SECS);
        let negative_window = uptime.is_some_and(|u| u >= policy::MIN_UPTIME_FOR_NO_ACCESS_SECS);

        let mut results = Vec::new();
        for table in ctx.schema.tables() {
            let key = (
                table.schema.to_ascii_lowercase(),
                table.name.to_ascii_lowercase(),
            );
            // A table missing from the counter view has simply not been
            // touched since engine start.
            let (reads, writes) = counters.get(&key).copied().unwrap_or((0, 0));

            if (reads > 0 || writes > 0) && positive_window {
                results.push(SignalResult::new(
                    table.object_ref(),
                    policy::WEIGHT_ACCESSED,
                    format!("{reads} reads, {writes} writes since engine start"),
                ));
            } else if reads == 0 && writes == 0 && negative_window {
                results.push(SignalResult::new(
                    table.object_ref(),
                    policy::WEIGHT_NO_ACCESS,
                    "no reads or writes over an extended uptime window",
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
    use schemalens_provider::{AccessStatsRow, CancellationToken, MockData, MockProvider};

    fn schema_with_table(name: &str) -> DatabaseSchema {
        let table = Table {
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
        };
        DatabaseSchema::new(None, vec![table], Vec::new()).unwrap()
    }

    async fn run(schema: &DatabaseSchema, data: MockData, uptime: Option<u64>) -> Vec<SignalResult> {
        let provider = MockProvider::new(data);
        let cancel = CancellationToken::new();
        let ctx = SignalContext {
            schema,
            provider: &provider,
            edges: &[],
            uptime_secs: uptime,
            cancel: &cancel,
        };
        AccessStatsSignal.evaluate(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_activity_positive_after_short_window() {
        let schema = schema_with_table("Order");
        let mut data = MockData::database("srv", "Sales");
        data.access_stats.push(AccessStatsRow {
            schema: "dbo".to_string(),
            table: "Order".to_string(),
            reads: 120,
            writes: 4,
        });

        let results = run(&schema, data, Some(2 * 86_400)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].weight, policy::WEIGHT_ACCESSED);
    }

    #[tokio::test]
    async fn test_zero_counters_need_the_long_window() {
        let schema = schema_with_table("Leftover");
        let data = MockData::database("srv", "Sales");

        // Two days up: zeros are not yet evidence.
        let results = run(&schema, data.clone(), Some(2 * 86_400)).await;
        assert!(results.is_empty());

        // A month up: zeros are evidence of disuse.
        let results = run(&schema, data, Some(30 * 86_400)).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].weight, policy::WEIGHT_NO_ACCESS);
    }
}
