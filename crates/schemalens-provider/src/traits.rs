//! Dialect provider trait definitions.
//!
//! One provider handle is bound to one server and (optionally) one database.
//! Handles are cheap to clone behind `Arc`; concurrent tasks never share a
//! live connection; each capability call acquires its own connection for
//! the duration of the query.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{
    AccessStatsRow, ColumnRow, DatabaseRow, Dialect, ExecutionStatsRow, ForeignKeyRow, IndexRow,
    ObjectRow, QueryRows, QueryStoreStatsRow, ReferenceRow, RowCountRow, ServerInfo, TableRow,
};

/// Catalog metadata queries.
///
/// All results are dialect-neutral flat rows; grouping into the schema model
/// happens in the extraction layer.
#[async_trait]
pub trait CatalogQueries: Send + Sync {
    /// List base tables in the current database.
    async fn list_tables(&self) -> Result<Vec<TableRow>, ProviderError>;

    /// List all table columns.
    async fn list_columns(&self) -> Result<Vec<ColumnRow>, ProviderError>;

    /// List index key columns.
    async fn list_indexes(&self) -> Result<Vec<IndexRow>, ProviderError>;

    /// List foreign key constraint columns.
    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>, ProviderError>;

    /// List non-table objects (views, procedures, functions, triggers, ...).
    async fn list_objects(&self) -> Result<Vec<ObjectRow>, ProviderError>;

    /// List object-to-object references.
    async fn list_references(&self) -> Result<Vec<ReferenceRow>, ProviderError>;
}

/// Performance and telemetry queries.
///
/// Any of these may return [`ProviderError::FeatureUnavailable`] (telemetry
/// view absent on this engine/version) or [`ProviderError::PrivilegeDenied`];
/// both degrade to "no evidence from this source".
#[async_trait]
pub trait PerformanceQueries: Send + Sync {
    /// Live execution counters for procedures and functions.
    async fn execution_stats(&self) -> Result<Vec<ExecutionStatsRow>, ProviderError>;

    /// Per-object counters from the persisted query-statistics store.
    async fn query_store_stats(&self) -> Result<Vec<QueryStoreStatsRow>, ProviderError>;

    /// Captured ad-hoc query texts from the persisted store.
    async fn query_store_texts(&self) -> Result<Vec<String>, ProviderError>;

    /// Table-level read/write counters.
    async fn access_stats(&self) -> Result<Vec<AccessStatsRow>, ProviderError>;

    /// Table row counts.
    async fn row_counts(&self) -> Result<Vec<RowCountRow>, ProviderError>;
}

/// Server-level queries.
#[async_trait]
pub trait ServerQueries: Send + Sync {
    /// Server name, version, and uptime.
    async fn server_info(&self) -> Result<ServerInfo, ProviderError>;

    /// Databases visible to the current login.
    async fn list_databases(&self) -> Result<Vec<DatabaseRow>, ProviderError>;
}

/// A dialect provider: raw query execution plus the three capability
/// interfaces.
///
/// Every call is independently read-only and idempotent; there is no ambient
/// transaction across calls.
#[async_trait]
pub trait DialectProvider:
    CatalogQueries + PerformanceQueries + ServerQueries + Send + Sync
{
    /// The dialect this provider speaks.
    fn dialect(&self) -> Dialect;

    /// Server or instance name this handle is bound to.
    fn server_name(&self) -> &str;

    /// Database this handle is bound to, if any. `None` means server scope
    /// (server mode).
    fn database(&self) -> Option<&str>;

    /// Execute an arbitrary read-only query.
    async fn execute_query(&self, sql: &str) -> Result<QueryRows, ProviderError>;

    /// Execute a query and return the first column of the first row.
    async fn execute_scalar(&self, sql: &str)
        -> Result<Option<serde_json::Value>, ProviderError>;

    /// Return a handle bound to another database on the same server.
    ///
    /// Used by server-mode fan-out; the original handle is unaffected.
    async fn for_database(
        &self,
        database: &str,
    ) -> Result<Arc<dyn DialectProvider>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe
    fn _assert_object_safe(_: &dyn DialectProvider) {}
}
