//! Row-count signal.
//!
//! Cheap structural evidence that is always available: an empty table is
//! mildly suspicious, a populated one is mildly alive. The weights are small
//! on purpose: row counts alone should never push an object to Unused.

use std::collections::HashMap;

use async_trait::async_trait;
use schemalens_provider::PerformanceQueries;

use crate::policy;
use crate::signal::{SignalContext, SignalResult, UsageSignal};
use crate::SignalError;

/// Table row count evaluator.
pub struct RowCountSignal;

#[async_trait]
impl UsageSignal for RowCountSignal {
    fn name(&self) -> &'static str {
        "row-count"
    }

    async fn evaluate(&self, ctx: &SignalContext<'_>) -> Result<Vec<SignalResult>, SignalError> {
        ctx.cancel.check()?;
        let counts = ctx.provider.row_counts().await?;

        let by_table: HashMap<(String, String), i64> = counts
            .into_iter()
            .map(|c| {
                (
                    (c.schema.to_ascii_lowercase(), c.table.to_ascii_lowercase()),
                    c.rows,
                )
            })
            .collect();

        let mut results = Vec::new();
        for table in ctx.schema.tables() {
            let key = (
                table.schema.to_ascii_lowercase(),
                table.name.to_ascii_lowercase(),
            );
            let Some(&rows) = by_table.get(&key) else {
                continue;
            };

            if rows == 0 {
                results.push(SignalResult::new(
                    table.object_ref(),
                    policy::WEIGHT_EMPTY_TABLE,
                    "table is empty",
                ));
            } else {
                results.push(SignalResult::new(
                    table.object_ref(),
                    policy::WEIGHT_POPULATED_TABLE,
                    format!("table holds {rows} rows"),
                ));
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_core::{DatabaseSchema, Table};
    use schemalens_provider::{CancellationToken, MockData, MockProvider, RowCountRow};

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
    async fn test_empty_and_populated_tables() {
        let schema = DatabaseSchema::new(
            None,
            vec![bare_table("Empty"), bare_table("Busy")],
            Vec::new(),
        )
        .unwrap();

        let mut data = MockData::database("srv", "Sales");
        data.row_counts = vec![
            RowCountRow {
                schema: "dbo".to_string(),
                table: "Empty".to_string(),
                rows: 0,
            },
            RowCountRow {
                schema: "dbo".to_string(),
                table: "Busy".to_string(),
                rows: 5000,
            },
        ];

        let provider = MockProvider::new(data);
        let cancel = CancellationToken::new();
        let ctx = SignalContext {
            schema: &schema,
            provider: &provider,
            edges: &[],
            uptime_secs: None,
            cancel: &cancel,
        };
        let results = RowCountSignal.evaluate(&ctx).await.unwrap();

        assert_eq!(results.len(), 2);
        let empty = results.iter().find(|r| r.object.name == "Empty").unwrap();
        assert_eq!(empty.weight, policy::WEIGHT_EMPTY_TABLE);
        let busy = results.iter().find(|r| r.object.name == "Busy").unwrap();
        assert_eq!(busy.weight, policy::WEIGHT_POPULATED_TABLE);
    }
}
