//! Shared fixtures for session integration tests.

use std::sync::Arc;

use async_trait::async_trait;
use schemalens_provider::{
    AccessStatsRow, ColumnRow, DatabaseRow, Dialect, DialectProvider, ExecutionStatsRow,
    ForeignKeyRow, IndexRow, MockData, MockProvider, ObjectRow, ProviderError, QueryRows,
    QueryStoreStatsRow, ReferenceRow, RowCountRow, ServerInfo, TableRow,
};
use schemalens_provider::{CatalogQueries, PerformanceQueries, ServerQueries};
use tokio::sync::Notify;

/// Single-database fixture: Order / OrderLine / Shipment plus a scratch
/// table, with one declared FK.
pub fn sales_fixture() -> MockData {
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
        .with_table("dbo", "tmp_LoadStage", &[("Id", "int", true, true)])
        .with_foreign_key("dbo", "OrderLine", "OrderId", "Order", "Id")
}

/// Provider that can park `row_counts` calls until released, so tests can
/// hold a run mid-flight deterministically. Blocking starts disabled; flip
/// it on once a baseline run has completed.
pub struct BlockingProvider {
    inner: MockProvider,
    blocking: std::sync::atomic::AtomicBool,
    release: Arc<Notify>,
    started: Arc<Notify>,
}

impl BlockingProvider {
    /// Returns the provider plus (started, release) signals: `started` fires
    /// when a blocked call is reached, `release` lets it proceed.
    pub fn new(data: MockData) -> (Arc<Self>, Arc<Notify>, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        let started = Arc::new(Notify::new());
        let provider = Arc::new(Self {
            inner: MockProvider::new(data),
            blocking: std::sync::atomic::AtomicBool::new(false),
            release: Arc::clone(&release),
            started: Arc::clone(&started),
        });
        (provider, started, release)
    }

    /// Enable or disable parking of `row_counts` calls.
    pub fn set_blocking(&self, on: bool) {
        self.blocking.store(on, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogQueries for BlockingProvider {
    async fn list_tables(&self) -> Result<Vec<TableRow>, ProviderError> {
        self.inner.list_tables().await
    }
    async fn list_columns(&self) -> Result<Vec<ColumnRow>, ProviderError> {
        self.inner.list_columns().await
    }
    async fn list_indexes(&self) -> Result<Vec<IndexRow>, ProviderError> {
        self.inner.list_indexes().await
    }
    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>, ProviderError> {
        self.inner.list_foreign_keys().await
    }
    async fn list_objects(&self) -> Result<Vec<ObjectRow>, ProviderError> {
        self.inner.list_objects().await
    }
    async fn list_references(&self) -> Result<Vec<ReferenceRow>, ProviderError> {
        self.inner.list_references().await
    }
}

#[async_trait]
impl PerformanceQueries for BlockingProvider {
    async fn execution_stats(&self) -> Result<Vec<ExecutionStatsRow>, ProviderError> {
        self.inner.execution_stats().await
    }
    async fn query_store_stats(&self) -> Result<Vec<QueryStoreStatsRow>, ProviderError> {
        self.inner.query_store_stats().await
    }
    async fn query_store_texts(&self) -> Result<Vec<String>, ProviderError> {
        self.inner.query_store_texts().await
    }
    async fn access_stats(&self) -> Result<Vec<AccessStatsRow>, ProviderError> {
        self.inner.access_stats().await
    }
    async fn row_counts(&self) -> Result<Vec<RowCountRow>, ProviderError> {
        if self.blocking.load(std::sync::atomic::Ordering::SeqCst) {
            self.started.notify_waiters();
            self.release.notified().await;
        }
        self.inner.row_counts().await
    }
}

#[async_trait]
impl ServerQueries for BlockingProvider {
    async fn server_info(&self) -> Result<ServerInfo, ProviderError> {
        self.inner.server_info().await
    }
    async fn list_databases(&self) -> Result<Vec<DatabaseRow>, ProviderError> {
        self.inner.list_databases().await
    }
}

#[async_trait]
impl DialectProvider for BlockingProvider {
    fn dialect(&self) -> Dialect {
        self.inner.dialect()
    }
    fn server_name(&self) -> &str {
        self.inner.server_name()
    }
    fn database(&self) -> Option<&str> {
        self.inner.database()
    }
    async fn execute_query(&self, sql: &str) -> Result<QueryRows, ProviderError> {
        self.inner.execute_query(sql).await
    }
    async fn execute_scalar(
        &self,
        sql: &str,
    ) -> Result<Option<serde_json::Value>, ProviderError> {
        self.inner.execute_scalar(sql).await
    }
    async fn for_database(
        &self,
        database: &str,
    ) -> Result<Arc<dyn DialectProvider>, ProviderError> {
        self.inner.for_database(database).await
    }
}
