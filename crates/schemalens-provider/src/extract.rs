//! Catalog extraction: capability rows → validated schema snapshot.
//!
//! The bulk sub-queries (columns, indexes, foreign keys, objects) are fanned
//! out concurrently and joined before the snapshot is assembled. Object
//! definitions being unreadable (privilege) degrades to an empty object
//! list; missing column or constraint metadata is fatal, since there is no
//! schema without it.

use std::collections::BTreeMap;

use schemalens_core::{
    Column, DatabaseSchema, DetectedVia, ForeignKey, Index, ObjectDependency, ObjectRef,
    SchemaObject, Table,
};
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::ProviderError;
use crate::traits::{CatalogQueries, DialectProvider};
use crate::types::{ColumnRow, ForeignKeyRow, IndexRow, ObjectRow, ReferenceRow};

/// Extract a full schema snapshot from the provider's current database.
///
/// With `qualify_database` set (server mode), every object carries the
/// database qualifier so canonical keys stay unique across the unioned
/// node space.
pub async fn extract_schema(
    provider: &dyn DialectProvider,
    cancel: &CancellationToken,
    qualify_database: bool,
) -> Result<DatabaseSchema, ProviderError> {
    cancel.check()?;
    let tables = provider.list_tables().await?;
    cancel.check()?;

    // Bulk sub-queries are independent; fetch them concurrently.
    let (columns, indexes, foreign_keys, objects) = tokio::join!(
        provider.list_columns(),
        provider.list_indexes(),
        provider.list_foreign_keys(),
        provider.list_objects(),
    );
    cancel.check()?;

    let columns = columns?;
    let indexes = indexes?;
    let foreign_keys = foreign_keys?;
    let objects = match objects {
        Ok(rows) => rows,
        Err(e) if e.is_degradable() => {
            warn!("object definitions unavailable, continuing without: {e}");
            Vec::new()
        }
        Err(e) => return Err(e),
    };

    let database = if qualify_database {
        provider.database().map(|d| d.to_string())
    } else {
        None
    };

    let mut column_groups = group_columns(columns);
    let mut index_groups = group_indexes(indexes);
    let mut fk_groups = group_foreign_keys(foreign_keys);

    let tables: Vec<Table> = tables
        .into_iter()
        .map(|t| {
            let key = (t.schema.clone(), t.name.clone());
            Table {
                database: database.clone(),
                schema: t.schema,
                name: t.name,
                columns: column_groups.remove(&key).unwrap_or_default(),
                indexes: index_groups.remove(&key).unwrap_or_default(),
                foreign_keys: fk_groups.remove(&key).unwrap_or_default(),
            }
        })
        .collect();

    let objects: Vec<SchemaObject> = objects
        .into_iter()
        .map(|o: ObjectRow| SchemaObject {
            reference: ObjectRef {
                database: database.clone(),
                schema: o.schema,
                name: o.name,
                kind: o.kind,
            },
            definition: o.definition,
        })
        .collect();

    debug!(
        "extracted schema: {} tables, {} other objects",
        tables.len(),
        objects.len()
    );

    DatabaseSchema::new(provider.database().map(|d| d.to_string()), tables, objects)
        .map_err(|e| ProviderError::with_context("assembling schema snapshot", e.to_string()))
}

/// Convert backend-detected reference rows into dependency edge facts.
///
/// `database` qualifies the referencing side (server mode); a reference row
/// carrying its own target database keeps it, which is how cross-database
/// edges stay tagged.
pub fn reference_edges(
    rows: &[ReferenceRow],
    database: Option<&str>,
) -> Vec<ObjectDependency> {
    rows.iter()
        .map(|r| ObjectDependency {
            from: ObjectRef {
                database: database.map(|d| d.to_string()),
                schema: r.from_schema.clone(),
                name: r.from_name.clone(),
                kind: r.from_kind,
            },
            to: ObjectRef {
                database: r
                    .to_database
                    .clone()
                    .or_else(|| database.map(|d| d.to_string())),
                schema: r.to_schema.clone(),
                name: r.to_name.clone(),
                kind: r.to_kind,
            },
            via: DetectedVia::ParsedReference,
        })
        .collect()
}

type TableKey = (String, String);

fn group_columns(rows: Vec<ColumnRow>) -> BTreeMap<TableKey, Vec<Column>> {
    let mut groups: BTreeMap<TableKey, Vec<Column>> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.schema, row.table))
            .or_default()
            .push(Column {
                name: row.name,
                ordinal: row.ordinal,
                data_type: row.data_type,
                is_nullable: row.is_nullable,
                is_primary_key: row.is_primary_key,
                is_identity: row.is_identity,
                default_value: row.default_value,
            });
    }
    for columns in groups.values_mut() {
        columns.sort_by_key(|c| c.ordinal);
    }
    groups
}

fn group_indexes(rows: Vec<IndexRow>) -> BTreeMap<TableKey, Vec<Index>> {
    // Key rows arrive one per index column; fold them in key order.
    let mut by_index: BTreeMap<(String, String, String), (Vec<(u32, String)>, bool, bool)> =
        BTreeMap::new();
    for row in rows {
        let entry = by_index
            .entry((row.schema, row.table, row.index_name))
            .or_insert_with(|| (Vec::new(), row.is_unique, row.is_primary));
        entry.0.push((row.key_ordinal, row.column_name));
    }

    let mut groups: BTreeMap<TableKey, Vec<Index>> = BTreeMap::new();
    for ((schema, table, name), (mut cols, is_unique, is_primary)) in by_index {
        cols.sort_by_key(|(ord, _)| *ord);
        groups.entry((schema, table)).or_default().push(Index {
            name,
            columns: cols.into_iter().map(|(_, c)| c).collect(),
            is_unique,
            is_primary,
        });
    }
    groups
}

fn group_foreign_keys(rows: Vec<ForeignKeyRow>) -> BTreeMap<TableKey, Vec<ForeignKey>> {
    let mut by_constraint: BTreeMap<
        (String, String, String),
        (Vec<(u32, String, String)>, String, String),
    > = BTreeMap::new();
    for row in rows {
        let entry = by_constraint
            .entry((row.schema, row.table, row.constraint_name))
            .or_insert_with(|| {
                (
                    Vec::new(),
                    row.referenced_schema.clone(),
                    row.referenced_table.clone(),
                )
            });
        entry
            .0
            .push((row.key_ordinal, row.column_name, row.referenced_column));
    }

    let mut groups: BTreeMap<TableKey, Vec<ForeignKey>> = BTreeMap::new();
    for ((schema, table, name), (mut pairs, ref_schema, ref_table)) in by_constraint {
        pairs.sort_by_key(|(ord, _, _)| *ord);
        let (columns, referenced_columns) = pairs
            .into_iter()
            .map(|(_, from, to)| (from, to))
            .unzip();
        groups.entry((schema, table)).or_default().push(ForeignKey {
            name,
            columns,
            referenced_schema: ref_schema,
            referenced_table: ref_table,
            referenced_columns,
        });
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCapability, MockData, MockProvider};
    use pretty_assertions::assert_eq;
    use schemalens_core::ObjectKind;

    fn fixture() -> MockData {
        MockData::database("srv", "Sales")
            .with_table(
                "dbo",
                "Order",
                &[("Id", "int", true, true), ("CustomerName", "nvarchar(100)", false, false)],
            )
            .with_table(
                "dbo",
                "OrderLine",
                &[("Id", "int", true, true), ("OrderId", "int", false, false)],
            )
            .with_foreign_key("dbo", "OrderLine", "OrderId", "Order", "Id")
    }

    #[tokio::test]
    async fn test_extract_groups_columns_and_fks() {
        let provider = MockProvider::new(fixture());
        let schema = extract_schema(&provider, &CancellationToken::new(), false)
            .await
            .unwrap();

        assert_eq!(schema.tables().len(), 2);
        let line = schema.table_by_name("OrderLine").unwrap();
        assert_eq!(line.columns.len(), 2);
        assert_eq!(line.foreign_keys.len(), 1);
        assert_eq!(line.foreign_keys[0].referenced_table, "Order");
        assert_eq!(line.foreign_keys[0].columns, vec!["OrderId"]);
    }

    #[tokio::test]
    async fn test_extract_qualifies_in_server_mode() {
        let provider = MockProvider::new(fixture());
        let schema = extract_schema(&provider, &CancellationToken::new(), true)
            .await
            .unwrap();

        let order = schema.table_by_name("Order").unwrap();
        assert_eq!(order.database.as_deref(), Some("Sales"));
        assert_eq!(order.object_ref().canonical_key(), "Sales.dbo.Order");
    }

    #[tokio::test]
    async fn test_unreadable_objects_degrade() {
        let data = fixture().denying(MockCapability::Objects);
        let provider = MockProvider::new(data);

        let schema = extract_schema(&provider, &CancellationToken::new(), false)
            .await
            .unwrap();
        assert!(schema.objects().is_empty());
        assert_eq!(schema.tables().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_columns_is_fatal() {
        let data = fixture().denying(MockCapability::Columns);
        let provider = MockProvider::new(data);

        let err = extract_schema(&provider, &CancellationToken::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::PrivilegeDenied { .. }));
    }

    #[tokio::test]
    async fn test_cancellation_short_circuits() {
        let provider = MockProvider::new(fixture());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = extract_schema(&provider, &cancel, false).await.unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }

    #[test]
    fn test_reference_edges_tag_cross_database() {
        let rows = vec![ReferenceRow {
            from_schema: "dbo".to_string(),
            from_name: "vSales".to_string(),
            from_kind: ObjectKind::View,
            to_schema: "dbo".to_string(),
            to_name: "Ledger".to_string(),
            to_kind: ObjectKind::Table,
            to_database: Some("Billing".to_string()),
        }];

        let edges = reference_edges(&rows, Some("Sales"));
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from.canonical_key(), "Sales.dbo.vSales");
        assert_eq!(edges[0].to.canonical_key(), "Billing.dbo.Ledger");
        assert!(edges[0].is_cross_database());
    }
}
