//! Data profile analyzer.
//!
//! Cheap per-table shape data: row count (when the provider can produce
//! one), column and index counts, primary key presence. Row counts being
//! unavailable degrades to `None` rather than failing the stage.

use std::collections::HashMap;

use async_trait::async_trait;
use schemalens_provider::PerformanceQueries;
use tracing::warn;

use crate::analyzers::{Analyzer, AnalyzerContext, AnalyzerKind};
use crate::error::SessionError;
use crate::result::{AnalyzerSlice, ProfileEntry};

/// Table shape profiler.
pub struct ProfileAnalyzer;

#[async_trait]
impl Analyzer for ProfileAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Profile
    }

    async fn run(&self, ctx: &AnalyzerContext<'_>) -> Result<AnalyzerSlice, SessionError> {
        ctx.cancel.check()?;

        let counts: HashMap<(String, String), i64> = match ctx.provider.row_counts().await {
            Ok(rows) => rows
                .into_iter()
                .map(|r| {
                    (
                        (r.schema.to_ascii_lowercase(), r.table.to_ascii_lowercase()),
                        r.rows,
                    )
                })
                .collect(),
            Err(e) if e.is_degradable() => {
                warn!("row counts unavailable, profiling structure only: {e}");
                HashMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        ctx.cancel.check()?;

        let entries: Vec<ProfileEntry> = ctx
            .schema
            .tables()
            .iter()
            .map(|table| {
                let key = (
                    table.schema.to_ascii_lowercase(),
                    table.name.to_ascii_lowercase(),
                );
                ProfileEntry {
                    object: table.object_ref(),
                    row_count: counts.get(&key).copied(),
                    column_count: table.columns.len(),
                    index_count: table.indexes.len(),
                    has_primary_key: !table.primary_key_columns().is_empty(),
                }
            })
            .collect();

        Ok(AnalyzerSlice::Profile(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_core::{Column, DatabaseSchema, Table};
    use schemalens_provider::{CancellationToken, MockCapability, MockData, MockProvider, RowCountRow};

    fn sample_schema() -> DatabaseSchema {
        let table = Table {
            database: None,
            schema: "dbo".to_string(),
            name: "Order".to_string(),
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

    #[tokio::test]
    async fn test_profile_with_row_counts() {
        let schema = sample_schema();
        let mut data = MockData::database("srv", "Sales");
        data.row_counts = vec![RowCountRow {
            schema: "dbo".to_string(),
            table: "Order".to_string(),
            rows: 250,
        }];
        let provider = MockProvider::new(data);
        let cancel = CancellationToken::new();
        let refs = schema.all_refs();
        let ctx = AnalyzerContext {
            provider: &provider,
            schema: &schema,
            known_refs: &refs,
            cancel: &cancel,
        };

        let AnalyzerSlice::Profile(entries) = ProfileAnalyzer.run(&ctx).await.unwrap() else {
            panic!("wrong slice kind");
        };
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].row_count, Some(250));
        assert!(entries[0].has_primary_key);
    }

    #[tokio::test]
    async fn test_profile_degrades_without_row_counts() {
        let schema = sample_schema();
        let data = MockData::database("srv", "Sales").denying(MockCapability::RowCounts);
        let provider = MockProvider::new(data);
        let cancel = CancellationToken::new();
        let refs = schema.all_refs();
        let ctx = AnalyzerContext {
            provider: &provider,
            schema: &schema,
            known_refs: &refs,
            cancel: &cancel,
        };

        let AnalyzerSlice::Profile(entries) = ProfileAnalyzer.run(&ctx).await.unwrap() else {
            panic!("wrong slice kind");
        };
        assert_eq!(entries[0].row_count, None);
        assert_eq!(entries[0].column_count, 1);
    }
}
