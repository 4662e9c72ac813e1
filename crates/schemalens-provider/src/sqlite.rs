//! SQLite dialect provider.
//!
//! Catalog metadata comes from `sqlite_master` and the table PRAGMAs. The
//! driver is synchronous, so every call opens its own read-only connection
//! inside `spawn_blocking`; concurrent capability calls never share a
//! connection. SQLite keeps no execution or access telemetry, so the
//! performance capabilities other than row counts answer
//! `FeatureUnavailable`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::ProviderError;
use crate::traits::{CatalogQueries, DialectProvider, PerformanceQueries, ServerQueries};
use crate::types::{
    AccessStatsRow, ColumnRow, DatabaseRow, Dialect, ExecutionStatsRow, ForeignKeyRow, IndexRow,
    ObjectRow, QueryRows, QueryStoreStatsRow, ReferenceRow, RowCountRow, ServerInfo, TableRow,
};
use schemalens_core::ObjectKind;

/// SQLite schema namespace; file databases expose their objects under `main`.
const SCHEMA: &str = "main";

/// Provider over one SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteProvider {
    path: PathBuf,
    server_name: String,
}

impl SqliteProvider {
    /// Open a provider for a database file, verifying it is readable.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProviderError> {
        let path = path.as_ref().to_path_buf();
        Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| ProviderError::connection(format!("{}: {e}", path.display())))?;

        let server_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("sqlite")
            .to_string();

        debug!("opened sqlite provider for {:?}", path);
        Ok(Self { path, server_name })
    }

    /// Run a closure against a fresh read-only connection on the blocking
    /// pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, ProviderError>
    where
        F: FnOnce(&Connection) -> Result<T, ProviderError> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
            f(&conn)
        })
        .await
        .map_err(|e| ProviderError::with_context("sqlite worker", e.to_string()))?
    }
}

fn table_names(conn: &Connection) -> Result<Vec<String>, ProviderError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Double-quote an identifier for interpolation into a PRAGMA.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_to_json(value: rusqlite::types::ValueRef<'_>) -> serde_json::Value {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(
            b.iter().map(|x| format!("{x:02x}")).collect::<String>(),
        ),
    }
}

#[async_trait]
impl CatalogQueries for SqliteProvider {
    async fn list_tables(&self) -> Result<Vec<TableRow>, ProviderError> {
        self.with_conn(|conn| {
            Ok(table_names(conn)?
                .into_iter()
                .map(|name| TableRow {
                    schema: SCHEMA.to_string(),
                    name,
                })
                .collect())
        })
        .await
    }

    async fn list_columns(&self) -> Result<Vec<ColumnRow>, ProviderError> {
        self.with_conn(|conn| {
            let mut rows = Vec::new();
            for table in table_names(conn)? {
                let mut stmt =
                    conn.prepare(&format!("PRAGMA table_info({})", quote_ident(&table)))?;
                let columns = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,            // cid
                        row.get::<_, String>(1)?,         // name
                        row.get::<_, String>(2)?,         // type
                        row.get::<_, i64>(3)?,            // notnull
                        row.get::<_, Option<String>>(4)?, // dflt_value
                        row.get::<_, i64>(5)?,            // pk
                    ))
                })?;
                for col in columns {
                    let (cid, name, data_type, notnull, default_value, pk) = col?;
                    // A single INTEGER primary key is a rowid alias, which
                    // auto-increments; that is the closest SQLite gets to an
                    // identity column.
                    let is_identity = pk == 1 && data_type.eq_ignore_ascii_case("integer");
                    rows.push(ColumnRow {
                        schema: SCHEMA.to_string(),
                        table: table.clone(),
                        name,
                        ordinal: (cid + 1) as u32,
                        data_type,
                        is_nullable: notnull == 0 && pk == 0,
                        is_primary_key: pk > 0,
                        is_identity,
                        default_value,
                    });
                }
            }
            Ok(rows)
        })
        .await
    }

    async fn list_indexes(&self) -> Result<Vec<IndexRow>, ProviderError> {
        self.with_conn(|conn| {
            let mut rows = Vec::new();
            for table in table_names(conn)? {
                let mut list =
                    conn.prepare(&format!("PRAGMA index_list({})", quote_ident(&table)))?;
                let indexes = list
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(1)?, // name
                            row.get::<_, i64>(2)?,    // unique
                            row.get::<_, String>(3)?, // origin: c, u, pk
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;

                for (index_name, unique, origin) in indexes {
                    let mut info =
                        conn.prepare(&format!("PRAGMA index_info({})", quote_ident(&index_name)))?;
                    let cols = info
                        .query_map([], |row| {
                            Ok((
                                row.get::<_, i64>(0)?,            // seqno
                                row.get::<_, Option<String>>(2)?, // name (None for expressions)
                            ))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;

                    for (seqno, column) in cols {
                        let Some(column_name) = column else { continue };
                        rows.push(IndexRow {
                            schema: SCHEMA.to_string(),
                            table: table.clone(),
                            index_name: index_name.clone(),
                            column_name,
                            key_ordinal: (seqno + 1) as u32,
                            is_unique: unique != 0,
                            is_primary: origin == "pk",
                        });
                    }
                }
            }
            Ok(rows)
        })
        .await
    }

    async fn list_foreign_keys(&self) -> Result<Vec<ForeignKeyRow>, ProviderError> {
        self.with_conn(|conn| {
            let mut rows = Vec::new();
            for table in table_names(conn)? {
                let mut stmt =
                    conn.prepare(&format!("PRAGMA foreign_key_list({})", quote_ident(&table)))?;
                let fks = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,            // id
                        row.get::<_, i64>(1)?,            // seq
                        row.get::<_, String>(2)?,         // table
                        row.get::<_, String>(3)?,         // from
                        row.get::<_, Option<String>>(4)?, // to (None = implicit pk)
                    ))
                })?;
                for fk in fks {
                    let (id, seq, referenced_table, column_name, to) = fk?;
                    rows.push(ForeignKeyRow {
                        schema: SCHEMA.to_string(),
                        table: table.clone(),
                        constraint_name: format!("fk_{table}_{id}"),
                        column_name,
                        key_ordinal: (seq + 1) as u32,
                        referenced_schema: SCHEMA.to_string(),
                        referenced_table,
                        referenced_column: to.unwrap_or_else(|| "rowid".to_string()),
                    });
                }
            }
            Ok(rows)
        })
        .await
    }

    async fn list_objects(&self) -> Result<Vec<ObjectRow>, ProviderError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT name, type, sql FROM sqlite_master \
                 WHERE type IN ('view', 'trigger') AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let objects = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(objects
                .into_iter()
                .map(|(name, kind, definition)| ObjectRow {
                    schema: SCHEMA.to_string(),
                    name,
                    kind: if kind == "view" {
                        ObjectKind::View
                    } else {
                        ObjectKind::Trigger
                    },
                    definition,
                })
                .collect())
        })
        .await
    }

    async fn list_references(&self) -> Result<Vec<ReferenceRow>, ProviderError> {
        // SQLite keeps no dependency catalog; scan view and trigger bodies
        // for table names as whole identifiers.
        let objects = self.list_objects().await?;
        let tables = self.list_tables().await?;

        let mut rows = Vec::new();
        for object in &objects {
            let Some(definition) = &object.definition else {
                continue;
            };
            for table in &tables {
                if table.name.eq_ignore_ascii_case(&object.name) {
                    continue;
                }
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&table.name));
                let re = Regex::new(&pattern)
                    .map_err(|e| ProviderError::with_context("reference scan", e.to_string()))?;
                if re.is_match(definition) {
                    rows.push(ReferenceRow {
                        from_schema: object.schema.clone(),
                        from_name: object.name.clone(),
                        from_kind: object.kind,
                        to_schema: table.schema.clone(),
                        to_name: table.name.clone(),
                        to_kind: ObjectKind::Table,
                        to_database: None,
                    });
                }
            }
        }
        Ok(rows)
    }
}

#[async_trait]
impl PerformanceQueries for SqliteProvider {
    async fn execution_stats(&self) -> Result<Vec<ExecutionStatsRow>, ProviderError> {
        Err(ProviderError::feature_unavailable(
            "execution statistics (sqlite keeps none)",
        ))
    }

    async fn query_store_stats(&self) -> Result<Vec<QueryStoreStatsRow>, ProviderError> {
        Err(ProviderError::feature_unavailable(
            "persisted query store (sqlite keeps none)",
        ))
    }

    async fn query_store_texts(&self) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::feature_unavailable(
            "persisted query store (sqlite keeps none)",
        ))
    }

    async fn access_stats(&self) -> Result<Vec<AccessStatsRow>, ProviderError> {
        Err(ProviderError::feature_unavailable(
            "access statistics (sqlite keeps none)",
        ))
    }

    async fn row_counts(&self) -> Result<Vec<RowCountRow>, ProviderError> {
        self.with_conn(|conn| {
            let mut rows = Vec::new();
            for table in table_names(conn)? {
                let count: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM {}", quote_ident(&table)),
                    [],
                    |row| row.get(0),
                )?;
                rows.push(RowCountRow {
                    schema: SCHEMA.to_string(),
                    table,
                    rows: count,
                });
            }
            Ok(rows)
        })
        .await
    }
}

#[async_trait]
impl ServerQueries for SqliteProvider {
    async fn server_info(&self) -> Result<ServerInfo, ProviderError> {
        let server_name = self.server_name.clone();
        self.with_conn(move |conn| {
            let version: String =
                conn.query_row("SELECT sqlite_version()", [], |row| row.get(0))?;
            Ok(ServerInfo {
                server_name,
                version: format!("SQLite {version}"),
                uptime_secs: None,
            })
        })
        .await
    }

    async fn list_databases(&self) -> Result<Vec<DatabaseRow>, ProviderError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("PRAGMA database_list")?;
            let names = stmt
                .query_map([], |row| row.get::<_, String>(1))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(names
                .into_iter()
                .map(|name| DatabaseRow { name })
                .collect())
        })
        .await
    }
}

#[async_trait]
impl DialectProvider for SqliteProvider {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn server_name(&self) -> &str {
        &self.server_name
    }

    fn database(&self) -> Option<&str> {
        Some(SCHEMA)
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryRows, ProviderError> {
        let sql = sql.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let columns: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(|c| c.to_string())
                .collect();
            let width = columns.len();

            let mut rows = Vec::new();
            let mut result = stmt.query([])?;
            while let Some(row) = result.next()? {
                let mut values = Vec::with_capacity(width);
                for i in 0..width {
                    values.push(cell_to_json(row.get_ref(i)?));
                }
                rows.push(values);
            }
            Ok(QueryRows { columns, rows })
        })
        .await
    }

    async fn execute_scalar(
        &self,
        sql: &str,
    ) -> Result<Option<serde_json::Value>, ProviderError> {
        let result = self.execute_query(sql).await?;
        Ok(result
            .rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next()))
    }

    async fn for_database(
        &self,
        database: &str,
    ) -> Result<Arc<dyn DialectProvider>, ProviderError> {
        if database == SCHEMA {
            return Ok(Arc::new(self.clone()));
        }
        Err(ProviderError::feature_unavailable(
            "multiple databases per sqlite file",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::extract::extract_schema;
    use tempfile::TempDir;

    fn sample_db(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sample.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE customer (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
             CREATE TABLE orders (
                 id INTEGER PRIMARY KEY,
                 customer_id INTEGER NOT NULL REFERENCES customer(id),
                 total REAL
             );
             CREATE INDEX ix_orders_customer_id ON orders(customer_id);
             CREATE VIEW v_order_totals AS
                 SELECT customer_id, SUM(total) FROM orders GROUP BY customer_id;
             INSERT INTO customer (name) VALUES ('acme');
             INSERT INTO orders (customer_id, total) VALUES (1, 9.5);",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_catalog_queries() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::open(sample_db(&dir)).unwrap();

        let tables = provider.list_tables().await.unwrap();
        let names: Vec<&str> = tables.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["customer", "orders"]);

        let columns = provider.list_columns().await.unwrap();
        let id = columns
            .iter()
            .find(|c| c.table == "customer" && c.name == "id")
            .unwrap();
        assert!(id.is_primary_key);
        assert!(id.is_identity);

        let fks = provider.list_foreign_keys().await.unwrap();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].table, "orders");
        assert_eq!(fks[0].referenced_table, "customer");
        assert_eq!(fks[0].referenced_column, "id");

        let indexes = provider.list_indexes().await.unwrap();
        assert!(indexes
            .iter()
            .any(|ix| ix.index_name == "ix_orders_customer_id" && ix.column_name == "customer_id"));
    }

    #[tokio::test]
    async fn test_view_references_scanned() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::open(sample_db(&dir)).unwrap();

        let refs = provider.list_references().await.unwrap();
        assert!(refs
            .iter()
            .any(|r| r.from_name == "v_order_totals" && r.to_name == "orders"));
        // "customer" appears only inside "customer_id", which must not count
        // as a whole-identifier hit.
        assert!(!refs
            .iter()
            .any(|r| r.from_name == "v_order_totals" && r.to_name == "customer"));
    }

    #[tokio::test]
    async fn test_row_counts_and_telemetry_gap() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::open(sample_db(&dir)).unwrap();

        let counts = provider.row_counts().await.unwrap();
        let orders = counts.iter().find(|c| c.table == "orders").unwrap();
        assert_eq!(orders.rows, 1);

        assert!(matches!(
            provider.execution_stats().await,
            Err(ProviderError::FeatureUnavailable { .. })
        ));
        assert!(matches!(
            provider.access_stats().await,
            Err(ProviderError::FeatureUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_end_to_end_extraction() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::open(sample_db(&dir)).unwrap();

        let schema = extract_schema(&provider, &CancellationToken::new(), false)
            .await
            .unwrap();

        assert_eq!(schema.tables().len(), 2);
        assert_eq!(schema.objects().len(), 1);

        let orders = schema.table_by_name("orders").unwrap();
        assert_eq!(orders.foreign_keys.len(), 1);
        assert!(orders.has_supporting_index("customer_id"));
    }

    #[tokio::test]
    async fn test_execute_scalar() {
        let dir = TempDir::new().unwrap();
        let provider = SqliteProvider::open(sample_db(&dir)).unwrap();

        let value = provider
            .execute_scalar("SELECT COUNT(*) FROM customer")
            .await
            .unwrap();
        assert_eq!(value, Some(serde_json::Value::from(1)));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = SqliteProvider::open("/nonexistent/path/to.db").unwrap_err();
        assert!(matches!(err, ProviderError::Connection(_)));
    }
}
