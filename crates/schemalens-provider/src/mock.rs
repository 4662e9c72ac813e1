//! In-memory mock provider.
//!
//! Serves fixture rows and scripted failures for orchestrator and signal
//! tests: populate a [`MockData`], mark capabilities as denied or
//! unavailable, attach sibling databases for server-mode scenarios, and hand
//! the provider to the code under test.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::traits::{CatalogQueries, DialectProvider, PerformanceQueries, ServerQueries};
use crate::types::{
    AccessStatsRow, ColumnRow, DatabaseRow, Dialect, ExecutionStatsRow, ForeignKeyRow, IndexRow,
    ObjectRow, QueryRows, QueryStoreStatsRow, ReferenceRow, RowCountRow, ServerInfo, TableRow,
};

/// Capabilities that can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCapability {
    Tables,
    Columns,
    Indexes,
    ForeignKeys,
    Objects,
    References,
    ExecutionStats,
    QueryStoreStats,
    QueryStoreTexts,
    AccessStats,
    RowCounts,
    ServerInfo,
    Databases,
}

impl MockCapability {
    fn name(self) -> &'static str {
        match self {
            MockCapability::Tables => "tables",
            MockCapability::Columns => "columns",
            MockCapability::Indexes => "indexes",
            MockCapability::ForeignKeys => "foreign keys",
            MockCapability::Objects => "objects",
            MockCapability::References => "references",
            MockCapability::ExecutionStats => "execution stats",
            MockCapability::QueryStoreStats => "query store stats",
            MockCapability::QueryStoreTexts => "query store texts",
            MockCapability::AccessStats => "access stats",
            MockCapability::RowCounts => "row counts",
            MockCapability::ServerInfo => "server info",
            MockCapability::Databases => "databases",
        }
    }
}

/// Fixture data served by a [`MockProvider`].
#[derive(Debug, Clone, Default)]
pub struct MockData {
    pub server_name: String,
    pub database: Option<String>,
    pub uptime_secs: Option<u64>,

    pub tables: Vec<TableRow>,
    pub columns: Vec<ColumnRow>,
    pub indexes: Vec<IndexRow>,
    pub foreign_keys: Vec<ForeignKeyRow>,
    pub objects: Vec<ObjectRow>,
    pub references: Vec<ReferenceRow>,

    pub execution_stats: Vec<ExecutionStatsRow>,
    pub query_store_stats: Vec<QueryStoreStatsRow>,
    pub query_store_texts: Vec<String>,
    pub access_stats: Vec<AccessStatsRow>,
    pub row_counts: Vec<RowCountRow>,

    pub databases: Vec<String>,

    /// Capabilities answering with `FeatureUnavailable`
    pub unavailable: HashSet<MockCapability>,

    /// Capabilities answering with `PrivilegeDenied`
    pub denied: HashSet<MockCapability>,

    /// Databases whose `for_database` handle is refused
    pub deny_databases: HashSet<String>,

    /// Per-database fixture sets for server-mode tests
    pub sibling_databases: HashMap<String, MockData>,
}

impl MockData {
    /// Fixture bound to one database.
    pub fn database(server: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            server_name: server.into(),
            database: Some(database.into()),
            ..Default::default()
        }
    }

    /// Fixture at server scope.
    pub fn server(server: impl Into<String>, databases: &[&str]) -> Self {
        Self {
            server_name: server.into(),
            database: None,
            databases: databases.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Add a table with its columns: `(name, type, is_pk, is_identity)`.
    pub fn with_table(mut self, schema: &str, name: &str, columns: &[(&str, &str, bool, bool)]) -> Self {
        self.tables.push(TableRow {
            schema: schema.to_string(),
            name: name.to_string(),
        });
        for (i, (col, ty, pk, identity)) in columns.iter().enumerate() {
            self.columns.push(ColumnRow {
                schema: schema.to_string(),
                table: name.to_string(),
                name: col.to_string(),
                ordinal: (i + 1) as u32,
                data_type: ty.to_string(),
                is_nullable: !pk,
                is_primary_key: *pk,
                is_identity: *identity,
                default_value: None,
            });
        }
        self
    }

    /// Add a single-column foreign key.
    pub fn with_foreign_key(
        mut self,
        schema: &str,
        table: &str,
        column: &str,
        referenced_table: &str,
        referenced_column: &str,
    ) -> Self {
        self.foreign_keys.push(ForeignKeyRow {
            schema: schema.to_string(),
            table: table.to_string(),
            constraint_name: format!("FK_{table}_{column}"),
            column_name: column.to_string(),
            key_ordinal: 1,
            referenced_schema: schema.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
        });
        self
    }

    /// Mark a capability as feature-unavailable.
    pub fn without(mut self, capability: MockCapability) -> Self {
        self.unavailable.insert(capability);
        self
    }

    /// Mark a capability as privilege-denied.
    pub fn denying(mut self, capability: MockCapability) -> Self {
        self.denied.insert(capability);
        self
    }
}

/// Scriptable in-memory provider.
#[derive(Debug, Clone)]
pub struct MockProvider {
    data: Arc<MockData>,
}

impl MockProvider {
    /// Wrap fixture data into a provider handle.
    pub fn new(data: MockData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    fn gate(&self, capability: MockCapability) -> Result<(), ProviderError> {
        if self.data.denied.contains(&capability) {
            return Err(ProviderError::privilege_denied(capability.name()));
        }
        if self.data.unavailable.contains(&capability) {
            return Err(ProviderError::feature_unavailable(capability.name()));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogQueries for MockProvider {
    async fn list_tables(&self) -> Result<Vec<TableRow>, ProviderError> {
        self.gate(MockCapability::Tables)?;
        Ok(self.data.tables.clone())
    }

    async fn list_columns(&self) -> Result<Vec<ColumnRow>, ProviderError> {
        self.gate(MockCapability::Columns)?;
        Ok(self.data.columns.clone())
    }

    async fn list_indexes(&self) -> Result<Vec<IndexRow>, ProviderError> {
        self.gate(MockCapability::Indexes)?;
        Ok(self.data.indexes.clone())
    }

    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>, ProviderError> {
        self.gate(MockCapability::ForeignKeys)?;
        Ok(self.data.foreign_keys.clone())
    }

    async fn list_objects(&self) -> Result<Vec<ObjectRow>, ProviderError> {
        self.gate(MockCapability::Objects)?;
        Ok(self.data.objects.clone())
    }

    async fn list_references(&self) -> Result<Vec<ReferenceRow>, ProviderError> {
        self.gate(MockCapability::References)?;
        Ok(self.data.references.clone())
    }
}

#[async_trait]
impl PerformanceQueries for MockProvider {
    async fn execution_stats(&self) -> Result<Vec<ExecutionStatsRow>, ProviderError> {
        self.gate(MockCapability::ExecutionStats)?;
        Ok(self.data.execution_stats.clone())
    }

    async fn query_store_stats(&self) -> Result<Vec<QueryStoreStatsRow>, ProviderError> {
        self.gate(MockCapability::QueryStoreStats)?;
        Ok(self.data.query_store_stats.clone())
    }

    async fn query_store_texts(&self) -> Result<Vec<String>, ProviderError> {
        self.gate(MockCapability::QueryStoreTexts)?;
        Ok(self.data.query_store_texts.clone())
    }

    async fn access_stats(&self) -> Result<Vec<AccessStatsRow>, ProviderError> {
        self.gate(MockCapability::AccessStats)?;
        Ok(self.data.access_stats.clone())
    }

    async fn row_counts(&self) -> Result<Vec<RowCountRow>, ProviderError> {
        self.gate(MockCapability::RowCounts)?;
        Ok(self.data.row_counts.clone())
    }
}

#[async_trait]
impl ServerQueries for MockProvider {
    async fn server_info(&self) -> Result<ServerInfo, ProviderError> {
        self.gate(MockCapability::ServerInfo)?;
        Ok(ServerInfo {
            server_name: self.data.server_name.clone(),
            version: "mock 1.0".to_string(),
            uptime_secs: self.data.uptime_secs,
        })
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseRow>, ProviderError> {
        self.gate(MockCapability::Databases)?;
        Ok(self
            .data
            .databases
            .iter()
            .map(|name| DatabaseRow { name: name.clone() })
            .collect())
    }
}

#[async_trait]
impl DialectProvider for MockProvider {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn server_name(&self) -> &str {
        &self.data.server_name
    }

    fn database(&self) -> Option<&str> {
        self.data.database.as_deref()
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryRows, ProviderError> {
        Ok(QueryRows::default())
    }

    async fn execute_scalar(
        &self,
        _sql: &str,
    ) -> Result<Option<serde_json::Value>, ProviderError> {
        Ok(None)
    }

    async fn for_database(
        &self,
        database: &str,
    ) -> Result<Arc<dyn DialectProvider>, ProviderError> {
        if self.data.deny_databases.contains(database) {
            return Err(ProviderError::privilege_denied(format!(
                "database '{database}'"
            )));
        }

        let data = match self.data.sibling_databases.get(database) {
            Some(sibling) => sibling.clone(),
            None => MockData {
                database: Some(database.to_string()),
                ..(*self.data).clone()
            },
        };
        Ok(Arc::new(MockProvider::new(data)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_roundtrip() {
        let data = MockData::database("srv", "Sales")
            .with_table("dbo", "Order", &[("Id", "int", true, true)]);
        let provider = MockProvider::new(data);

        let tables = provider.list_tables().await.unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "Order");

        let columns = provider.list_columns().await.unwrap();
        assert_eq!(columns.len(), 1);
        assert!(columns[0].is_primary_key);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let data = MockData::database("srv", "Sales")
            .without(MockCapability::QueryStoreStats)
            .denying(MockCapability::AccessStats);
        let provider = MockProvider::new(data);

        assert!(matches!(
            provider.query_store_stats().await,
            Err(ProviderError::FeatureUnavailable { .. })
        ));
        assert!(matches!(
            provider.access_stats().await,
            Err(ProviderError::PrivilegeDenied { .. })
        ));
    }

    #[tokio::test]
    async fn test_for_database_denial() {
        let mut data = MockData::server("srv", &["Sales", "Billing"]);
        data.deny_databases.insert("Billing".to_string());
        let provider = MockProvider::new(data);

        assert!(provider.for_database("Sales").await.is_ok());
        assert!(matches!(
            provider.for_database("Billing").await,
            Err(ProviderError::PrivilegeDenied { .. })
        ));
    }
}
