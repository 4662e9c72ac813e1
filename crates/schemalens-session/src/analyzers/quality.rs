//! Structural quality analyzer.
//!
//! Pure checks over the schema snapshot. Finding codes are stable report
//! vocabulary; severities grade how urgently a finding usually matters.

use async_trait::async_trait;

use crate::analyzers::{Analyzer, AnalyzerContext, AnalyzerKind};
use crate::error::SessionError;
use crate::result::{AnalyzerSlice, QualityFinding, Severity};

/// Column count past which a table is flagged as wide.
const WIDE_TABLE_COLUMNS: usize = 30;

/// Structural quality checker.
pub struct QualityAnalyzer;

#[async_trait]
impl Analyzer for QualityAnalyzer {
    fn kind(&self) -> AnalyzerKind {
        AnalyzerKind::Quality
    }

    async fn run(&self, ctx: &AnalyzerContext<'_>) -> Result<AnalyzerSlice, SessionError> {
        ctx.cancel.check()?;

        let mut findings = Vec::new();
        for table in ctx.schema.tables() {
            let object = table.object_ref();

            if table.primary_key_columns().is_empty() {
                findings.push(QualityFinding {
                    object: object.clone(),
                    code: "missing_primary_key".to_string(),
                    message: "table has no primary key; rows cannot be addressed individually"
                        .to_string(),
                    severity: Severity::High,
                });
            }

            for fk in &table.foreign_keys {
                let leading = &fk.columns[0];
                if !table.has_supporting_index(leading) {
                    findings.push(QualityFinding {
                        object: object.clone(),
                        code: "unindexed_foreign_key".to_string(),
                        message: format!(
                            "foreign key column '{leading}' has no supporting index; \
                             lookups and cascades scan the table"
                        ),
                        severity: Severity::Medium,
                    });
                }
            }

            if table.columns.len() > WIDE_TABLE_COLUMNS {
                findings.push(QualityFinding {
                    object: object.clone(),
                    code: "wide_table".to_string(),
                    message: format!(
                        "{} columns; consider whether the table mixes several entities",
                        table.columns.len()
                    ),
                    severity: Severity::Low,
                });
            }

            if !table.columns.is_empty() && table.columns.iter().all(|c| c.is_nullable) {
                findings.push(QualityFinding {
                    object,
                    code: "all_columns_nullable".to_string(),
                    message: "every column is nullable; no field is guaranteed present"
                        .to_string(),
                    severity: Severity::Low,
                });
            }
        }

        Ok(AnalyzerSlice::Quality(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemalens_core::{Column, DatabaseSchema, ForeignKey, Table};
    use schemalens_provider::{CancellationToken, MockData, MockProvider};

    fn column(name: &str, nullable: bool, pk: bool) -> Column {
        Column {
            name: name.to_string(),
            ordinal: 1,
            data_type: "int".to_string(),
            is_nullable: nullable,
            is_primary_key: pk,
            is_identity: false,
            default_value: None,
        }
    }

    async fn findings_for(schema: DatabaseSchema) -> Vec<QualityFinding> {
        let provider = MockProvider::new(MockData::database("srv", "Sales"));
        let cancel = CancellationToken::new();
        let refs = schema.all_refs();
        let ctx = AnalyzerContext {
            provider: &provider,
            schema: &schema,
            known_refs: &refs,
            cancel: &cancel,
        };
        let AnalyzerSlice::Quality(findings) = QualityAnalyzer.run(&ctx).await.unwrap() else {
            panic!("wrong slice kind");
        };
        findings
    }

    #[tokio::test]
    async fn test_missing_primary_key_flagged() {
        let table = Table {
            database: None,
            schema: "dbo".to_string(),
            name: "Heap".to_string(),
            columns: vec![column("Value", true, false)],
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        };
        let schema = DatabaseSchema::new(None, vec![table], Vec::new()).unwrap();

        let findings = findings_for(schema).await;
        assert!(findings.iter().any(|f| f.code == "missing_primary_key"));
        assert!(findings.iter().any(|f| f.code == "all_columns_nullable"));
    }

    #[tokio::test]
    async fn test_unindexed_foreign_key_flagged() {
        let table = Table {
            database: None,
            schema: "dbo".to_string(),
            name: "OrderLine".to_string(),
            columns: vec![column("Id", false, true), column("OrderId", false, false)],
            indexes: Vec::new(),
            foreign_keys: vec![ForeignKey {
                name: "FK_OrderLine_Order".to_string(),
                columns: vec!["OrderId".to_string()],
                referenced_schema: "dbo".to_string(),
                referenced_table: "Order".to_string(),
                referenced_columns: vec!["Id".to_string()],
            }],
        };
        let schema = DatabaseSchema::new(None, vec![table], Vec::new()).unwrap();

        let findings = findings_for(schema).await;
        let fk = findings
            .iter()
            .find(|f| f.code == "unindexed_foreign_key")
            .unwrap();
        assert_eq!(fk.severity, Severity::Medium);
        assert!(fk.message.contains("OrderId"));
    }

    #[tokio::test]
    async fn test_clean_table_yields_nothing() {
        let mut table = Table {
            database: None,
            schema: "dbo".to_string(),
            name: "Order".to_string(),
            columns: vec![column("Id", false, true), column("Total", true, false)],
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        };
        table.indexes.push(schemalens_core::Index {
            name: "PK_Order".to_string(),
            columns: vec!["Id".to_string()],
            is_unique: true,
            is_primary: true,
        });
        let schema = DatabaseSchema::new(None, vec![table], Vec::new()).unwrap();

        let findings = findings_for(schema).await;
        assert!(findings.is_empty());
    }
}
